use std::fmt::Write;

/// Escape `&`, `<`, `>`, `"`, and `'` for safe inclusion in HTML text or a
/// quoted attribute value.
///
pub(crate) fn escape_html(input: &str) -> String {
    let mut output = String::with_capacity(input.len());

    for c in input.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' => output.push_str("&#34;"),
            '\'' => output.push_str("&#39;"),
            _ => output.push(c),
        }
    }

    output
}

/// Append ` name="value"` to `output`, escaping the value.
///
pub(crate) fn push_attr(output: &mut String, name: &str, value: &str) {
    let _ = write!(output, " {}=\"{}\"", name, escape_html(value));
}

#[cfg(test)]
mod tests {
    use super::{escape_html, push_attr};

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<a href="x">'&'</a>"#),
            "&lt;a href=&#34;x&#34;&gt;&#39;&amp;&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn pushes_escaped_attributes() {
        let mut output = String::from("<input");
        push_attr(&mut output, "value", "a\"b");
        assert_eq!(output, "<input value=\"a&#34;b\"");
    }
}
