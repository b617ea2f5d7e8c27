use clap::Parser;
use color_eyre::eyre::{eyre, WrapErr};
use color_eyre::Result;
use datasette_plot::chart_export::PngRenderer;
use datasette_plot::source::FileSource;
use datasette_plot::{
    bootstrap, build_spec, share_url, App, AppConfig, AppEvent, Args, ConfigManager, PlotEditor,
    Preview, RowSource, APP_NAME,
};
use ratatui::DefaultTerminal;
use std::sync::mpsc::channel;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use url::Url;

fn render(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    terminal.draw(|frame| frame.render_widget(app, frame.area()))?;
    Ok(())
}

fn run(mut terminal: DefaultTerminal, app: &mut App) -> Result<()> {
    let (tx, rx) = channel::<AppEvent>();
    render(&mut terminal, app)?;
    tx.send(AppEvent::Open(app.location().clone()))?;

    loop {
        if crossterm::event::poll(std::time::Duration::from_millis(25))? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key) => tx.send(AppEvent::Key(key))?,
                crossterm::event::Event::Resize(cols, rows) => {
                    tx.send(AppEvent::Resize(cols, rows))?
                }
                _ => {}
            }
        }

        let updated = match rx.recv_timeout(std::time::Duration::from_millis(0)) {
            Ok(event) => {
                match event {
                    AppEvent::Exit => break,
                    event => {
                        if let Some(event) = app.event(&event) {
                            tx.send(event)?;
                        }
                    }
                }
                true
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => false,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        };

        if updated {
            render(&mut terminal, app)?;
        }
    }
    Ok(())
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.generate_config {
        match ConfigManager::new(APP_NAME) {
            Ok(config_manager) => match config_manager.write_default_config(args.force) {
                Ok(config_path) => {
                    println!("Configuration file written to: {}", config_path.display());
                    return Ok(Some(()));
                }
                Err(e) => {
                    eprintln!("Error writing configuration file: {}", e);
                    std::process::exit(1);
                }
            },
            Err(e) => {
                eprintln!("Error initializing config manager: {}", e);
                std::process::exit(1);
            }
        }
    }

    Ok(None)
}

/// Log to a file; the terminal belongs to the UI.
fn init_logging(args: &Args) -> Result<()> {
    let path = match &args.log_file {
        Some(p) => p.clone(),
        None => dirs::cache_dir()
            .ok_or_else(|| eyre!("Could not determine cache directory"))?
            .join(APP_NAME)
            .join(format!("{}.log", APP_NAME)),
    };
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .wrap_err_with(|| format!("Failed to open log file at {}", path.display()))?;

    let default_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_env("DATASETTE_PLOT_LOG")
        .unwrap_or_else(|_| EnvFilter::new(format!("datasette_plot={}", default_level)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = AppConfig::load(APP_NAME)?;
    if let Some(width) = args.width {
        config.plot.width = width;
    }
    if let Some(height) = args.height {
        config.plot.height = height;
    }
    if let Some(kind) = &args.mark {
        config.set_default_mark(kind)?;
    }
    if let Some(timeout) = args.timeout_secs {
        config.fetch.timeout_secs = timeout;
    }
    if args.debug {
        config.debug.enabled = true;
    }
    config.validate()?;
    Ok(config)
}

fn row_source(args: &Args, config: &AppConfig) -> Result<Box<dyn RowSource>> {
    if let Some(path) = &args.data {
        return Ok(Box::new(FileSource::new(path)));
    }
    #[cfg(feature = "http")]
    {
        Ok(Box::new(datasette_plot::source::HttpSource {
            timeout: std::time::Duration::from_secs(config.fetch.timeout_secs),
            page_size: config.fetch.page_size.clone(),
        }))
    }
    #[cfg(not(feature = "http"))]
    {
        let _ = config;
        Err(eyre!("Built without HTTP support; pass --data FILE"))
    }
}

/// Restore, normalize and either print or export the plot without a terminal UI.
fn run_headless(args: &Args, config: &AppConfig, location: &Url) -> Result<()> {
    let source = row_source(args, config)?;
    let options = config.bootstrap_options();
    let b = bootstrap(location, source.as_ref(), &options)?;
    let editor = PlotEditor::new(b.marks, &b.dataset, &options.group_key);
    if let Some(banner) = &b.banner {
        eprintln!("{}", banner);
    }

    if args.print_url {
        println!("{}", share_url(&b.location, editor.marks()));
    }
    if let Some(path) = &args.export {
        let spec = build_spec(editor.marks(), &b.dataset, &config.preview_options());
        let mut preview = Preview::new(PngRenderer::new(path));
        preview.refresh(spec, &b.dataset)?;
        println!("Chart written to {}", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    color_eyre::install()?;
    init_logging(&args)?;
    let config = load_config(&args)?;

    let raw = args
        .location
        .as_deref()
        .ok_or_else(|| eyre!("A Datasette page URL is required"))?;
    let location = Url::parse(raw).wrap_err_with(|| format!("Invalid URL: {}", raw))?;

    if args.print_url || args.export.is_some() {
        if let Err(e) = run_headless(&args, &config, &location) {
            eprintln!("Error: {}", datasette_plot::error_display::user_message_from_report(&e));
            std::process::exit(1);
        }
        return Ok(());
    }

    let source = row_source(&args, &config)?;
    let mut app = App::new(config, source, location)?;
    if args.debug {
        app.enable_debug();
    }

    let terminal = ratatui::init();
    let result = run(terminal, &mut app);
    ratatui::restore();
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    println!("{}", app.location());
    Ok(())
}
