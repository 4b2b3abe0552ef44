//! Minimal error page.

/// Escape text for use in HTML content and attribute values.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Render a self-contained error page for `status`.
pub fn get_error_html(status: u16, message: &str) -> String {
    let message = escape_html(message);
    let color = if status >= 500 { "#713fc2" } else { "#006ce9" };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <meta charset="utf-8">
  <meta http-equiv="Status" content="{status}">
  <title>{status} {message}</title>
  <meta name="viewport" content="width=device-width,initial-scale=1">
  <style>
    body {{ color: {color}; background-color: #fafafa; padding: 30px; font-family: Helvetica, sans-serif; }}
    p {{ max-width: 600px; margin: 60px auto 30px auto; background: white; border-radius: 4px; box-shadow: 0px 0px 50px -20px {color}; overflow: hidden; }}
    strong {{ display: inline-block; padding: 15px; background: {color}; color: white; }}
    span {{ display: inline-block; padding: 15px; }}
  </style>
</head>
<body><p><strong>{status}</strong> <span>{message}</span></p></body>
</html>"#
    )
}
