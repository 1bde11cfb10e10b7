//! HTML Pages
//!
//! Server-rendered markup. The purchase form posts through htmx, which
//! swaps the form in place on validation errors and follows `HX-Redirect`
//! on success.

use shop_core::form::{MAX_QUANTITY, MIN_QUANTITY, QUANTITY_FIELD};
use shop_core::{FieldErrors, PurchaseForm};

use crate::flash::FlashMessage;

const HTMX_SRC: &str = "https://unpkg.com/htmx.org@1.9.12";

/// Escape text for element content and double-quoted attributes
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, publishable_key: &str, messages: &[FlashMessage], body: &str) -> String {
    let flashes: String = messages
        .iter()
        .map(|m| {
            format!(
                r#"<li class="message {}">{}</li>"#,
                m.level.as_str(),
                escape(&m.text)
            )
        })
        .collect();
    let flashes = if flashes.is_empty() {
        String::new()
    } else {
        format!(r#"<ul class="messages">{flashes}</ul>"#)
    };
    
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <meta name="stripe-publishable-key" content="{key}">
  <title>{title}</title>
  <link rel="stylesheet" href="/static/shop.css">
  <script src="{HTMX_SRC}"></script>
</head>
<body>
  <main>
    {flashes}
    {body}
  </main>
</body>
</html>
"#,
        key = escape(publishable_key),
        title = escape(title),
    )
}

/// The purchase form on its own (swapped in by htmx after a failed submit)
pub fn product_form(form: &PurchaseForm, errors: Option<&FieldErrors>) -> String {
    let field_errors: String = errors
        .map(|e| e.get(QUANTITY_FIELD))
        .unwrap_or_default()
        .iter()
        .map(|msg| format!(r#"<li>{}</li>"#, escape(msg)))
        .collect();
    let field_errors = if field_errors.is_empty() {
        String::new()
    } else {
        format!(r#"<ul class="errorlist">{field_errors}</ul>"#)
    };
    
    format!(
        r#"<form id="purchase-form" hx-post="/purchase" hx-target="this" hx-swap="outerHTML">
  <label for="id_quantity">Quantity</label>
  {field_errors}
  <input type="number" name="{QUANTITY_FIELD}" id="id_quantity" min="{MIN_QUANTITY}" max="{MAX_QUANTITY}" value="{value}" required>
  <button type="submit">Buy now</button>
</form>"#,
        value = escape(&form.quantity_value()),
    )
}

pub fn home(form: &PurchaseForm, messages: &[FlashMessage], publishable_key: &str) -> String {
    let body = format!(
        r#"<h1>The one product</h1>
    <p>Everything you need, in a single box.</p>
    {}"#,
        product_form(form, None)
    );
    layout("Shop", publishable_key, messages, &body)
}

pub fn purchase_success(publishable_key: &str) -> String {
    layout(
        "Thank you",
        publishable_key,
        &[],
        r#"<h1>Thank you for your purchase!</h1>
    <p>Your order has been received. A confirmation email is on its way.</p>
    <p><a href="/">Back to the shop</a></p>"#,
    )
}
