//! Host-side helper: `cargo run` builds the WASM bundle into `dist/pkg` and
//! serves `dist/` (assembled by build.rs) locally. Browsers only grant camera
//! access on localhost or HTTPS, so open the printed localhost URL.

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::io::Result<()> {
    use std::io::{Error, ErrorKind};
    use std::process::{Command, Stdio};
    use std::{env, thread, time::Duration};

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 1. Compile the wasm bundle where index.html expects it. build.rs skips
    //    wasm32 builds, so this does not clobber dist/.
    log::info!("Building WASM pkg …");
    match Command::new("wasm-pack")
        .args(["build", "--release", "--target", "web", "--out-dir", "dist/pkg"])
        .status()
    {
        Ok(status) if status.success() => {}
        Ok(status) => {
            return Err(Error::new(
                ErrorKind::Other,
                format!("wasm-pack exited with {status}"),
            ));
        }
        Err(err) => {
            log::warn!("wasm-pack not runnable ({err}); serving whatever is already in dist/pkg");
        }
    }

    // 2. Serve dist/: the page, the shaders for the fetch loader and pkg/.
    let port = env::var("PORT").unwrap_or_else(|_| "8000".to_string());
    log::info!("Serving dist/ at http://127.0.0.1:{port}");
    let mut server = Command::new("python3")
        .args(["-m", "http.server", &port, "--directory", "dist"])
        .stdout(Stdio::null())
        .stderr(Stdio::inherit())
        .spawn()?;

    // Keep the helper alive as long as the server is.
    loop {
        if let Some(status) = server.try_wait()? {
            log::info!("http server exited with {status}");
            return Ok(());
        }
        thread::sleep(Duration::from_secs(1));
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}
