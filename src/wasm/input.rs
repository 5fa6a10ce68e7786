use log::debug;
use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{Document, KeyboardEvent};

use super::describe;
use crate::error::InitError;
use crate::operation::OperationSelector;

/// Feeds every `keydown` on the page body into `selector`. The listener lives for
/// the rest of the page's life.
pub fn listen_for_keys(document: &Document, selector: OperationSelector) -> Result<(), InitError> {
    let body = document
        .body()
        .ok_or_else(|| InitError::Dom("document has no body".into()))?;

    let handler = Closure::wrap(Box::new(move |event: KeyboardEvent| {
        let key = event.key();
        debug!("handling key {key}");
        selector.handle_token(&key);
        debug!("triggering operation {}", selector.pending());
    }) as Box<dyn FnMut(KeyboardEvent)>);

    body.add_event_listener_with_callback("keydown", handler.as_ref().unchecked_ref())
        .map_err(|err| InitError::Dom(describe(&err)))?;
    handler.forget();
    Ok(())
}
