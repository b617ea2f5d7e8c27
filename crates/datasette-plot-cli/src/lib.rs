//! Shared CLI definitions for datasette-plot.
//!
//! Used by the main application and by the build script (manpage) and
//! gen_docs binary (command-line-options markdown).

use clap::{CommandFactory, Parser};
use std::path::PathBuf;

/// Command-line arguments for datasette-plot
#[derive(Clone, Parser, Debug)]
#[command(
    name = "datasette-plot",
    version,
    about = "Chart marks over Datasette results in the terminal",
    long_about = include_str!("../long_about.txt")
)]
pub struct Args {
    /// Datasette page URL (table or query page). Repeated _plot-mark parameters restore a shared plot.
    /// Not required with --generate-config
    #[arg(required_unless_present = "generate_config", value_name = "URL")]
    pub location: Option<String>,

    /// Read the page's JSON response from this file instead of fetching it over HTTP
    #[arg(long = "data", value_name = "FILE")]
    pub data: Option<PathBuf>,

    /// Render the restored plot to a PNG file and exit (no terminal UI)
    #[arg(long = "export", value_name = "PNG")]
    pub export: Option<PathBuf>,

    /// Export width in pixels (overrides config [plot] width)
    #[arg(long = "width", value_name = "PX")]
    pub width: Option<u32>,

    /// Export height in pixels (overrides config [plot] height)
    #[arg(long = "height", value_name = "PX")]
    pub height: Option<u32>,

    /// Kind of the initial mark when the URL carries none: dot, bar-y or line-y
    /// (overrides config [plot] default_mark)
    #[arg(long = "mark", value_name = "KIND")]
    pub mark: Option<String>,

    /// Print the share URL for the restored plot and exit
    #[arg(long = "print-url", action)]
    pub print_url: bool,

    /// Request timeout in seconds for the data fetch (overrides config [fetch] timeout_secs)
    #[arg(long = "timeout", value_name = "SECS")]
    pub timeout_secs: Option<u64>,

    /// Write logs to this file (default: cache directory). Filter with DATASETTE_PLOT_LOG
    #[arg(long = "log-file", value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Enable debug mode to show operational information
    #[arg(long = "debug", action)]
    pub debug: bool,

    /// Generate default configuration file at ~/.config/datasette-plot/config.toml
    #[arg(long = "generate-config", action)]
    pub generate_config: bool,

    /// Force overwrite existing config file when using --generate-config
    #[arg(long = "force", requires = "generate_config", action)]
    pub force: bool,
}

/// Escape `|` and newlines for use in markdown table cells.
fn escape_table_cell(s: &str) -> String {
    s.replace('|', "\\|").replace(['\n', '\r'], " ")
}

/// Render command-line options as markdown.
pub fn render_options_markdown() -> String {
    let mut cmd = Args::command();
    cmd.build();

    let mut out = String::from("# Command Line Options\n\n");

    out.push_str("## Usage\n\n```\n");
    let usage = cmd.render_usage();
    out.push_str(&usage.to_string());
    out.push_str("\n```\n\n");

    out.push_str("## Options\n\n");
    out.push_str("| Option | Description |\n");
    out.push_str("|--------|-------------|\n");

    for arg in cmd.get_arguments() {
        let id = arg.get_id().as_ref().to_string();
        if id == "help" || id == "version" {
            continue;
        }

        let placeholder: String = arg
            .get_value_names()
            .map(|names| {
                names
                    .iter()
                    .map(|n: &clap::builder::Str| format!("<{}>", n.as_ref() as &str))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();

        let option_str = if arg.is_positional() {
            format!("[{placeholder}]")
        } else {
            let mut parts = Vec::new();
            if let Some(s) = arg.get_short() {
                parts.push(format!("-{s}"));
            }
            if let Some(l) = arg.get_long() {
                parts.push(format!("--{l}"));
            }
            let op = parts.join(", ");
            if arg.get_action().takes_values() && !placeholder.is_empty() {
                format!("{op} {placeholder}")
            } else {
                op
            }
        };

        let help = arg
            .get_help()
            .map(|h| escape_table_cell(&h.to_string()))
            .unwrap_or_else(|| "-".to_string());

        out.push_str(&format!("| `{option_str}` | {help} |\n"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_is_positional() {
        let args = Args::parse_from(["datasette-plot", "http://localhost:8001/db/t"]);
        assert_eq!(args.location.as_deref(), Some("http://localhost:8001/db/t"));
        assert!(!args.print_url);
        assert!(args.export.is_none());
    }

    #[test]
    fn generate_config_needs_no_location() {
        let args = Args::try_parse_from(["datasette-plot", "--generate-config"]).unwrap();
        assert!(args.generate_config);
        assert!(args.location.is_none());
        assert!(Args::try_parse_from(["datasette-plot"]).is_err());
    }

    #[test]
    fn force_requires_generate_config() {
        assert!(Args::try_parse_from(["datasette-plot", "http://x/db/t", "--force"]).is_err());
    }

    #[test]
    fn options_markdown_lists_flags() {
        let md = render_options_markdown();
        assert!(md.contains("`--export <PNG>`"));
        assert!(md.contains("`--print-url`"));
        assert!(md.contains("`[<URL>]`"));
        assert!(!md.contains("--help"));
    }
}
