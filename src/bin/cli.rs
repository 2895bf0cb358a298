use anyhow::{anyhow, bail, Context};
use crabsnap::host::VideoFrameSource;
use crabsnap::{
    CameraSession, CrabSnapConfig, FacingMode, NativeMediaDevices, PreviewSurface, RasterCanvas,
    SnapshotLink, StartOutcome,
};
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    crabsnap::init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: crabsnap-cli <list-devices|snapshot> [args]");
        std::process::exit(1);
    }

    let command = &args[1];
    match command.as_str() {
        "list-devices" => cmd_list_devices(&args).await,
        "snapshot" => cmd_snapshot(&args).await,
        _ => {
            eprintln!("Unknown command: {}", command);
            std::process::exit(1);
        }
    }
}

fn new_session(config: CrabSnapConfig) -> CameraSession<NativeMediaDevices, PreviewSurface> {
    let preview = PreviewSurface::from_config(&config.display);
    CameraSession::new(NativeMediaDevices::default(), preview, config)
}

async fn cmd_list_devices(args: &[String]) -> anyhow::Result<()> {
    let mut session = new_session(CrabSnapConfig::load_or_default());
    let devices = session.try_list_devices().await?;

    if args.contains(&"--json".to_string()) {
        println!("{}", serde_json::to_string(&devices)?);
    } else if devices.is_empty() {
        println!("No cameras found");
    } else {
        for d in devices {
            println!("{}: {}", d.device_id, d.label);
        }
    }
    Ok(())
}

async fn cmd_snapshot(args: &[String]) -> anyhow::Result<()> {
    // Parse args: snapshot [output.png] [--facing user|environment] [--warmup <frames>]
    let mut output = None;
    let mut facing = None;
    let mut warmup = 5;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--facing" => {
                i += 1;
                let value = args.get(i).ok_or_else(|| anyhow!("--facing needs a value"))?;
                facing = Some(value.parse::<FacingMode>().map_err(|e| anyhow!(e))?);
            }
            "--warmup" => {
                i += 1;
                let value = args.get(i).ok_or_else(|| anyhow!("--warmup needs a value"))?;
                warmup = value.parse().context("--warmup must be a frame count")?;
            }
            other if other.starts_with("--") => bail!("Unknown option: {}", other),
            other => output = Some(other.to_string()),
        }
        i += 1;
    }

    let output = output.unwrap_or_else(|| {
        format!("snapshot_{}.png", chrono::Local::now().format("%Y%m%d_%H%M%S"))
    });

    let mut config = CrabSnapConfig::load_or_default();
    if let Some(facing) = facing {
        config.session.facing_mode = facing;
    }
    let mut session = new_session(config);

    match session.try_start(true).await? {
        StartOutcome::Streaming(mode) => log::info!("Streaming with facing {}", mode),
        StartOutcome::Selected(device) => log::info!("Selected camera {:?}", device),
    }

    // Let exposure settle before the real frame
    for _ in 0..warmup {
        let _ = session.video().current_frame();
    }

    let mut canvas = RasterCanvas::default();
    let mut link = SnapshotLink::new();
    let captured = session.try_capture_frame(Some(&mut canvas), Some(&mut link));
    session.stop();
    captured?;

    let png = link.png_bytes()?;
    std::fs::write(&output, &png).with_context(|| format!("Failed to write {}", output))?;
    println!("Saved {} ({} bytes)", output, png.len());
    Ok(())
}
