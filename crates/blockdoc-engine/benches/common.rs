// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_markup(size: usize) -> String {
    let base = concat!(
        "<h1>Title</h1>",
        r#"<p style="color: red">Paragraph with <b>bold</b> and <i>italic</i> text.</p>"#,
        "<ul><li>First</li><li>Second</li></ul>",
        r#"<pre spellcheck="false">fn example() {}</pre>"#,
        r#"<figure class="media"><img src="a.png" width="300"></figure>"#,
        r#"<div data-block-type="columns"><div class="columns">"#,
        r#"<div class="column"><p>left</p></div><div class="column"><p>right</p></div>"#,
        "</div></div>",
    );
    base.repeat(size)
}
