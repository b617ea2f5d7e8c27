//! Binary that emits command-line options markdown to stdout.

fn main() {
    print!("{}", datasette_plot_cli::render_options_markdown());
}
