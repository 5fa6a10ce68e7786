// Assembles the static site in `dist/`: the page from `static/` plus the GLSL
// sources under `dist/shaders/` so `"source": "fetch"` configs can load them.
use std::path::Path;
use std::{env, fs};

use fs_extra::dir::{copy, CopyOptions};

fn main() {
    println!("cargo:rerun-if-changed=static");
    println!("cargo:rerun-if-changed=src/shaders");

    // Nothing to assemble for the wasm32 build itself; wasm-pack drives that.
    if env::var("TARGET").unwrap_or_default() == "wasm32-unknown-unknown" {
        return;
    }

    let out_dir = Path::new("dist");
    if out_dir.exists() {
        fs::remove_dir_all(out_dir).ok();
    }
    if let Err(err) = fs::create_dir_all(out_dir) {
        println!("cargo:warning=cannot create dist/: {err}");
        return;
    }

    let options = CopyOptions {
        overwrite: true,
        content_only: true,
        ..CopyOptions::new()
    };

    let static_dir = Path::new("static");
    if static_dir.exists() {
        if let Err(err) = copy(static_dir, out_dir, &options) {
            println!("cargo:warning=copying static/ failed: {err}");
        }
    }

    let shaders = out_dir.join("shaders");
    if let Err(err) = fs::create_dir_all(&shaders) {
        println!("cargo:warning=cannot create dist/shaders: {err}");
        return;
    }
    if let Err(err) = copy("src/shaders", &shaders, &options) {
        println!("cargo:warning=copying shaders failed: {err}");
    }
}
