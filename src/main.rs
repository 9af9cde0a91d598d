use clap::{Parser, Subcommand};
use genstudio::logger::{self, LogLevel, LoggerConfig};
use genstudio::{
    default_models, AnalysisModel, AspectRatio, CancellationToken, ChatMode, ChatSession,
    Config, GeminiClient, GenerationRequest, ImageInput, Resolution,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Parser)]
#[command(name = "genstudio")]
#[command(about = "Face analysis, speech, chat and video generation on Gemini", long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a video from a prompt, a seed image, or both
    Video {
        #[arg(short, long)]
        prompt: Option<String>,
        #[arg(short, long)]
        image: Option<String>,
        /// Render 9:16 instead of 16:9
        #[arg(long)]
        portrait: bool,
        /// 720p or 1080p; derived from the inputs when omitted
        #[arg(long)]
        resolution: Option<Resolution>,
    },
    /// Estimate age, gender and expression of a face
    Analyze {
        image: String,
        #[arg(long)]
        detailed: bool,
        /// Also read the result aloud into this raw PCM file
        #[arg(long)]
        speak: Option<String>,
    },
    /// Synthesize speech into a raw PCM file
    Speak { text: String, output: String },
    /// Interactive chat on stdin
    Chat {
        /// Ground answers in web search instead of extended reasoning
        #[arg(long)]
        search: bool,
    },
    /// List the models the clients use
    Models,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let dotenv_loaded = dotenv::dotenv().is_ok();
    let level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    logger::init_with_config(LoggerConfig::default().with_level(level))?;
    if !dotenv_loaded {
        log::debug!("No .env file found, using system environment variables");
    }

    if let Commands::Models = cli.command {
        for model in default_models() {
            println!("{:<32} {:<16} {}", model.id, model.name, model.description);
        }
        return Ok(());
    }

    let config = Config::from_env().gemini;
    logger::log_client_info(&config);
    let client = GeminiClient::new(config)?;

    match cli.command {
        Commands::Video {
            prompt,
            image,
            portrait,
            resolution,
        } => run_video(&client, prompt, image, portrait, resolution).await,
        Commands::Analyze {
            image,
            detailed,
            speak,
        } => run_analyze(&client, &image, detailed, speak).await,
        Commands::Speak { text, output } => {
            let audio = client.speech().synthesize(&text).await?;
            tokio::fs::write(&output, &audio.data).await?;
            log::info!(
                "🔊 Wrote {} bytes of {} to {}",
                audio.data.len(),
                audio.mime_type,
                output
            );
            Ok(())
        }
        Commands::Chat { search } => run_chat(&client, search).await,
        Commands::Models => Ok(()),
    }
}

async fn read_image(path: &str) -> Result<ImageInput, Box<dyn std::error::Error>> {
    let data = tokio::fs::read(path).await?;
    Ok(ImageInput::from_path_bytes(path, data))
}

async fn run_video(
    client: &GeminiClient,
    prompt: Option<String>,
    image: Option<String>,
    portrait: bool,
    resolution: Option<Resolution>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut request = GenerationRequest::new();
    if let Some(prompt) = prompt {
        request = request.with_prompt(prompt);
    }
    if let Some(path) = image {
        request = request.with_image(read_image(&path).await?);
    }
    if portrait {
        request = request.with_aspect_ratio(AspectRatio::Portrait);
    }
    if let Some(resolution) = resolution {
        request = request.with_resolution(resolution);
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("🛑 Interrupt received, cancelling video job");
            on_interrupt.cancel();
        }
    });

    match client.video().submit_with_cancel(request, &cancel).await {
        Ok(result) => {
            log::info!(
                "🎬 Video ready after {} status checks ({}, {})",
                result.status_checks,
                result.aspect_ratio,
                result.resolution
            );
            println!("{}", result.media_uri);
            Ok(())
        }
        Err(e) => {
            log::error!("❌ Video generation failed: {}", e);
            eprintln!("{}", e.user_message());
            Err(e.into())
        }
    }
}

async fn run_analyze(
    client: &GeminiClient,
    path: &str,
    detailed: bool,
    speak: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let image = read_image(path).await?;
    let model = if detailed {
        AnalysisModel::Detailed
    } else {
        AnalysisModel::Fast
    };

    let analysis = match speak {
        Some(output) => {
            let (analysis, audio) = client.describe_and_speak(&image, model).await?;
            tokio::fs::write(&output, &audio.data).await?;
            log::info!("🔊 Wrote spoken summary to {}", output);
            analysis
        }
        None => client.analysis().analyze_face(&image, model).await?,
    };

    println!("{}", serde_json::to_string_pretty(&analysis)?);
    Ok(())
}

async fn run_chat(client: &GeminiClient, search: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mode = if search {
        ChatMode::Grounded
    } else {
        ChatMode::Reasoning
    };
    let mut session = ChatSession::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    log::info!("💬 Chatting with {} (empty line or EOF to quit)", mode.model_id());

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let message = line.trim();
        if message.is_empty() {
            break;
        }

        match session.send(client.chat(), message, mode).await {
            Ok(reply) => {
                println!("{}", reply.text);
                for url in reply.grounding_urls.iter().flatten() {
                    println!("  source: {}", url);
                }
            }
            Err(e) => log::error!("❌ Chat turn failed: {}", e),
        }
    }

    log::info!("Conversation ended after {} messages", session.len());
    Ok(())
}
