use clap::{Parser, Subcommand};
use stencil_maker::client::StencilClient;
use stencil_maker::config;
use stencil_maker::form::{Axis, Component, Filter, FormEvent, Orientation};
use stencil_maker::output;
use stencil_maker::persist::FileWriter;
use stencil_maker::pipeline::{PipelineKind, PipelineState};
use stencil_maker::request::{GenerationRequest, SelectedImage, build_request};
use stencil_maker::rotator::LoadingRotator;
use stencil_maker::session::{Event, Session};
use stencil_maker::share::ShareFacility;
use stencil_maker::transport::Transport;
use stencil_maker::units::{UnitSystem, coerce_number};
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::{mpsc, watch};
use tracing_subscriber::EnvFilter;

/// Everything the form on the phone screen would hold.
#[derive(clap::Args, Clone, Debug)]
struct FormArgs {
    /// Photo to turn into a stencil
    #[arg(long)]
    image: Option<PathBuf>,

    /// Unit system for width and height
    #[arg(long, value_enum, default_value_t = UnitSystem::Metric)]
    unit: UnitSystem,
    /// Width in cm
    #[arg(long, allow_hyphen_values = true)]
    width: Option<String>,
    /// Height in cm
    #[arg(long, allow_hyphen_values = true)]
    height: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    width_ft: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    width_in: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    height_ft: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    height_in: Option<String>,

    /// Add white margins around the stencil
    #[arg(long)]
    margins: bool,
    /// Unit system for the margins
    #[arg(long, value_enum, default_value_t = UnitSystem::Metric)]
    margin_unit: UnitSystem,
    /// Left/right margin in cm
    #[arg(long, allow_hyphen_values = true)]
    margin_x: Option<String>,
    /// Top/bottom margin in cm
    #[arg(long, allow_hyphen_values = true)]
    margin_y: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    margin_x_ft: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    margin_x_in: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    margin_y_ft: Option<String>,
    #[arg(long, allow_hyphen_values = true)]
    margin_y_in: Option<String>,

    #[arg(long, value_enum, default_value_t = Filter::Color)]
    filter: Filter,
    #[arg(long, value_enum, default_value_t = Orientation::Portrait)]
    orientation: Orientation,
}

impl FormArgs {
    /// Replay the flags as the edits a user would make.
    fn events(&self) -> Vec<Event> {
        let mut events = vec![
            Event::Form(FormEvent::SetSizeUnit(self.unit)),
            Event::Form(FormEvent::SetMarginUnit(self.margin_unit)),
            Event::Form(FormEvent::SetMargins(self.margins)),
            Event::Form(FormEvent::SetFilter(self.filter)),
            Event::Form(FormEvent::SetOrientation(self.orientation)),
        ];

        let typed = [
            (Axis::Width, Component::Centimeters, &self.width),
            (Axis::Width, Component::Feet, &self.width_ft),
            (Axis::Width, Component::Inches, &self.width_in),
            (Axis::Height, Component::Centimeters, &self.height),
            (Axis::Height, Component::Feet, &self.height_ft),
            (Axis::Height, Component::Inches, &self.height_in),
            (Axis::MarginX, Component::Centimeters, &self.margin_x),
            (Axis::MarginX, Component::Feet, &self.margin_x_ft),
            (Axis::MarginX, Component::Inches, &self.margin_x_in),
            (Axis::MarginY, Component::Centimeters, &self.margin_y),
            (Axis::MarginY, Component::Feet, &self.margin_y_ft),
            (Axis::MarginY, Component::Inches, &self.margin_y_in),
        ];
        for (axis, component, text) in typed {
            if let Some(text) = text {
                events.push(Event::Form(FormEvent::SetValue {
                    axis,
                    component,
                    value: coerce_number(text),
                }));
            }
        }

        if let Some(path) = &self.image {
            events.push(Event::ImageSelected(SelectedImage::new(path)));
        }
        events
    }

    fn session(&self) -> Session {
        let mut session = Session::new();
        for event in self.events() {
            session.update(event);
        }
        session
    }
}

#[derive(Parser)]
#[command(name = "stencil-maker")]
#[command(about = "Turn a photo into a printable, gridded stencil")]
#[command(long_about = "\
Turn a photo into a printable, gridded stencil

The photo is sent to the stencil-maker rendering service together with the
physical size you want (centimeters, or feet and inches), optional white
margins, a filter and an orientation.

  preview     render a gridded preview image and report its size
  download    render the multi-page PDF, save it and hand it to the share
              command (or print where it was saved)
  both        run preview and download side by side
  fields      print the request that would be sent, without sending it

Examples:

  stencil-maker download --image cat.jpg --width 50 --height 70 --filter outline
  stencil-maker preview --image cat.jpg --unit ft --width-ft 3 --width-in 3
  stencil-maker fields --image cat.jpg --margins --margin-unit ft --margin-x-in 2

Settings (server, storage directory, share command) live in
stencil-maker.toml. Run 'stencil-maker gen-config' for a documented one.")]
#[command(version)]
struct Cli {
    /// Config file (default: ./stencil-maker.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override server.base_url
    #[arg(long, global = true)]
    server: Option<String>,

    /// More log output (-v info, -vv debug, -vvv trace); RUST_LOG wins
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a preview image
    Preview {
        #[command(flatten)]
        form: FormArgs,
        /// Print the preview as a data URI on stdout
        #[arg(long)]
        data_uri: bool,
    },
    /// Render, save and share the PDF stencil
    Download {
        #[command(flatten)]
        form: FormArgs,
    },
    /// Run preview and download concurrently
    Both {
        #[command(flatten)]
        form: FormArgs,
    },
    /// Print the multipart fields without sending anything
    Fields {
        #[command(flatten)]
        form: FormArgs,
        /// Print the fields as a JSON object
        #[arg(long)]
        json: bool,
    },
    /// Print a stock stencil-maker.toml with all options documented
    GenConfig,
}

const PREVIEW: &[PipelineKind] = &[PipelineKind::Preview];
const DOWNLOAD: &[PipelineKind] = &[PipelineKind::Download];
const BOTH: &[PipelineKind] = &[PipelineKind::Preview, PipelineKind::Download];

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cwd = std::env::current_dir()?;
    let config_path = config::locate_config(cli.config.as_deref(), &cwd);
    let mut client_config = config::load_config(config_path.as_deref())?;
    if let Some(server) = cli.server {
        client_config.server.base_url = server;
        client_config.validate()?;
    }

    let (form, kinds, data_uri): (FormArgs, &[PipelineKind], bool) = match cli.command {
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            return Ok(ExitCode::SUCCESS);
        }
        Command::Fields { form, json } => {
            let session = form.session();
            return Ok(match build_request(&session.form, session.image()) {
                Ok(request) if json => {
                    println!("{:#}", output::request_json(&request));
                    ExitCode::SUCCESS
                }
                Ok(request) => {
                    output::print_lines(&output::format_request(&request));
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    output::print_notifications(&[e.notification(PipelineKind::Preview)]);
                    ExitCode::FAILURE
                }
            });
        }
        Command::Preview { form, data_uri } => (form, PREVIEW, data_uri),
        Command::Download { form } => (form, DOWNLOAD, false),
        Command::Both { form } => (form, BOTH, false),
    };

    let client = StencilClient::from_config(&client_config);
    let mut session = form.session();
    let view = View {
        verbose: cli.verbose > 0,
        data_uri,
    };
    run_session(&client, &mut session, kinds, view).await;

    let failed = kinds
        .iter()
        .any(|kind| session.state(*kind) != PipelineState::Succeeded);
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Clone, Copy)]
struct View {
    verbose: bool,
    data_uri: bool,
}

/// Trigger `kinds` and feed everything they report back into `session`
/// until all of them have finished.
async fn run_session<T, W, S>(
    client: &StencilClient<T, W, S>,
    session: &mut Session,
    kinds: &[PipelineKind],
    view: View,
) where
    T: Transport,
    W: FileWriter,
    S: ShareFacility,
{
    let mut begin = |kind: PipelineKind| {
        if kinds.contains(&kind) {
            session.begin(kind)
        } else {
            None
        }
    };
    let preview_request = begin(PipelineKind::Preview);
    let download_request = begin(PipelineKind::Download);
    output::print_notifications(&session.take_notifications());

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let preview_run = preview_request.map(|request| {
        run_pipeline(client, PipelineKind::Preview, request, events_tx.clone())
    });
    let download_run = download_request.map(|request| {
        run_pipeline(client, PipelineKind::Download, request, events_tx.clone())
    });
    drop(events_tx);

    let pipelines = async move {
        let preview = async move {
            if let Some(run) = preview_run {
                run.await;
            }
        };
        let download = async move {
            if let Some(run) = download_run {
                run.await;
            }
        };
        tokio::join!(preview, download);
    };

    let interface = async {
        while let Some(event) = events_rx.recv().await {
            render(&event, view);
            session.update(event);
            output::print_notifications(&session.take_notifications());
        }
    };

    tokio::join!(pipelines, interface);
}

/// One pipeline run with its own loading messages.
///
/// Status and progress are forwarded as session events; the finishing
/// event is sent last, after the rotator is torn down.
async fn run_pipeline<T, W, S>(
    client: &StencilClient<T, W, S>,
    kind: PipelineKind,
    request: GenerationRequest,
    events: mpsc::UnboundedSender<Event>,
) where
    T: Transport,
    W: FileWriter,
    S: ShareFacility,
{
    let (rotator, status) = LoadingRotator::start(kind, client.status_interval());
    let status_forward = tokio::spawn(forward_status(kind, status, events.clone()));

    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
    let progress_events = events.clone();
    let progress_forward = tokio::spawn(async move {
        while let Some(event) = progress_rx.recv().await {
            if progress_events.send(Event::Progress(event)).is_err() {
                break;
            }
        }
    });

    let finished = match kind {
        PipelineKind::Preview => {
            Event::PreviewFinished(client.preview(&request, Some(progress_tx)).await)
        }
        PipelineKind::Download => {
            Event::DownloadFinished(client.download(&request, Some(progress_tx)).await)
        }
    };

    rotator.stop();
    // Both forwarders end once their channels close; a join error only
    // means the task was cancelled, which is fine here.
    let _ = status_forward.await;
    let _ = progress_forward.await;
    let _ = events.send(finished);
}

async fn forward_status(
    kind: PipelineKind,
    mut status: watch::Receiver<String>,
    events: mpsc::UnboundedSender<Event>,
) {
    loop {
        let text = status.borrow_and_update().clone();
        if events.send(Event::Status { kind, text }).is_err() {
            break;
        }
        if status.changed().await.is_err() {
            break;
        }
    }
}

fn render(event: &Event, view: View) {
    match event {
        Event::Status { kind, text } => eprintln!("{}", output::format_status(*kind, text)),
        Event::Progress(progress) if view.verbose => {
            eprintln!("{}", output::format_stage(progress))
        }
        Event::PreviewFinished(Ok(preview)) => {
            output::print_lines(&output::format_preview(preview));
            if view.data_uri {
                println!("{}", preview.data_uri);
            }
        }
        Event::DownloadFinished(Ok(outcome)) => {
            output::print_lines(&output::format_download(outcome));
        }
        _ => {}
    }
}
