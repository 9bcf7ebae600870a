use clap::Parser;
use metals_countdown::{Field, PriceDisplay};

#[derive(Debug, Parser)]
#[clap(name = "metals-countdown", version)]
pub struct Cli {
    /// Base URL of the metals server
    #[clap(long, env = "METALS_SERVER", default_value = "http://localhost:8080")]
    pub server: String,

    /// Unit override (`oz` or `gr`); defaults to the server's setting
    #[clap(long)]
    pub unit: Option<String>,
}

/// Prints every field write as `<class>: <text>`.
#[derive(Debug, Default)]
pub struct TerminalDisplay;

impl PriceDisplay for TerminalDisplay {
    fn set_html(&mut self, field: Field, html: &str) {
        println!("{:>16}: {}", field.class_name(), strip_tags(html));
    }
}

/// Drops markup, keeping text content.
pub(crate) fn strip_tags(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}
