use clap::{Arg, ArgAction, Command};
use scanner3d_data::Model;
use scanner3d_driver::{run_scanner, ScannerConfig, ScannerEvent};
use std::fs::File;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

struct Args {
    port: Option<String>,
    config: Option<String>,
    seconds: u64,
    output: Option<String>,
}

fn get_args() -> Args {
    let matches = Command::new("3D scanner console.")
        .about("Runs one scan and reconstructs the surface.")
        .disable_version_flag(true)
        .arg(
            Arg::new("port")
                .help("The device path to a serial port, overrides the config file")
                .use_value_delimiter(false),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("seconds")
                .long("seconds")
                .short('s')
                .default_value("60")
                .value_parser(clap::value_parser!(u64))
                .help("How long to scan"),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .action(ArgAction::Set)
                .help("Write the mesh as JSON to this file"),
        )
        .get_matches();

    Args {
        port: matches.get_one::<String>("port").cloned(),
        config: matches.get_one::<String>("config").cloned(),
        seconds: *matches.get_one::<u64>("seconds").unwrap(),
        output: matches.get_one::<String>("output").cloned(),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,scanner3d_driver=debug")),
        )
        .init();

    let args = get_args();
    let mut config = match &args.config {
        Some(path) => ScannerConfig::load_or_default(path),
        None => ScannerConfig::default(),
    };
    if let Some(port) = args.port {
        config.serial.port = port;
    }

    let scanner = run_scanner(&config).unwrap();
    let controller = scanner.controller();
    let events = controller.subscribe();

    println!("Waiting for {} ...", config.serial.port);
    while !controller.device_status().connected {
        std::thread::sleep(Duration::from_millis(100));
    }

    if let Err(e) = controller.start_scan(config.volume) {
        eprintln!("Cannot start scan: {e}");
        return;
    }

    let mut model = Model::new();
    let deadline = Instant::now() + Duration::from_secs(args.seconds);
    while Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(200));
        model.extend(controller.scanned_points());

        for event in events.receiver.try_iter() {
            match event {
                ScannerEvent::Link { connected } => println!("link up: {connected}"),
                ScannerEvent::Status(text) => println!("status: {text}"),
                ScannerEvent::DeviceError(text) => eprintln!("device error: {text}"),
                ScannerEvent::DeviceState(_) | ScannerEvent::Acknowledged => {}
            }
        }
        print!(
            "\r{} points in {} slices",
            model.total_points(),
            model.slices().len()
        );
    }
    println!();

    if let Err(e) = controller.pause() {
        eprintln!("Cannot pause scan: {e}");
    }
    model.extend(controller.scanned_points());

    let mesh = model.reconstruct();
    println!(
        "{} vertices, {} triangles",
        mesh.vertices.len(),
        mesh.triangle_count()
    );

    if let Some(path) = args.output {
        let file = File::create(&path).unwrap();
        serde_json::to_writer_pretty(file, &mesh).unwrap();
        println!("Mesh written to {path}");
    }

    drop(scanner);
}
