use clap::{Parser, Subcommand};
use serial_conn::config::{Config, ConfigLoader, LogFormat};
use serial_conn::{ConnectionConfig, RawOpenParams, SerialConnection};
use tracing_subscriber::EnvFilter;

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    name = "serial-conn",
    version,
    about = "List serial ports and exchange raw bytes with a device.",
    long_about = "A thin front-end over the serial_conn library: enumerate ports, open one with explicit line settings, write a payload and read back the reply."
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the serial ports available on this system.
    List {
        /// Print the ports as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Open a port, write a payload, read the reply and close.
    Exchange {
        /// Port name or alias; falls back to the configured default port.
        #[arg(short, long)]
        port: Option<String>,

        /// Baud rate; falls back to the configured baud rate.
        #[arg(short, long)]
        baud: Option<u32>,

        /// Read/write timeout in milliseconds; falls back to the configured timeout.
        #[arg(short, long)]
        timeout_ms: Option<u32>,

        /// Data bits: 5, 6, 7 or 8.
        #[arg(long, default_value_t = 8)]
        data_bits: u32,

        /// Parity: 0 none, 1 odd, 2 even.
        #[arg(long, default_value_t = 0)]
        parity: u32,

        /// Stop bits: 0 one, 1 one-point-five, 2 two.
        #[arg(long, default_value_t = 0)]
        stop_bits: u32,

        /// Flow control: 0 none, 1 software, 2 hardware.
        #[arg(long, default_value_t = 0)]
        flow_control: u32,

        /// Payload to write.
        #[arg(short, long, default_value = "")]
        data: String,

        /// Number of bytes to read back; defaults to the payload length.
        #[arg(short, long)]
        read: Option<usize>,

        /// Print the reply as hex instead of text.
        #[arg(long)]
        hex: bool,
    },
    /// Print the library version.
    Version,
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Compact => builder.compact().init(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = ConfigLoader::load()?.into_config();
    init_tracing(&config);

    match args.command {
        Command::List { json } => list(&config, json),
        Command::Exchange {
            port,
            baud,
            timeout_ms,
            data_bits,
            parity,
            stop_bits,
            flow_control,
            data,
            read,
            hex,
        } => {
            let port = port
                .or_else(|| config.serial.default_port.clone())
                .ok_or("no port given and no default port configured")?;

            // Start from the configured defaults, then apply explicit flags.
            let timeout = timeout_ms.unwrap_or(config.serial.timeout_ms);
            let mut params = RawOpenParams::from(config.serial.connection_config(&port));
            if let Some(baud) = baud {
                params.baud_rate = baud;
            }
            params.read_constant_ms = timeout;
            params.write_constant_ms = timeout;
            params.data_bits = data_bits;
            params.parity = parity;
            params.stop_bits = stop_bits;
            params.flow_control = flow_control;

            exchange(&config, &params, timeout, data.as_bytes(), read, hex)
        }
        Command::Version => {
            println!("{}", serial_conn::version());
            Ok(())
        }
    }
}

fn list(config: &Config, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let serial = SerialConnection::with_auto_close(
        serial_conn::port::SystemTransport::new(),
        config.serial.auto_close,
    );
    let ports = serial.list_ports()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&ports)?);
        return Ok(());
    }

    if ports.is_empty() {
        println!("No serial ports detected on this system");
    }
    for port in &ports {
        println!("{}\t{}\t{}", port.port, port.description, port.hardware_id);
    }
    Ok(())
}

fn exchange(
    config: &Config,
    params: &RawOpenParams,
    timeout_ms: u32,
    payload: &[u8],
    read: Option<usize>,
    hex: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut serial = SerialConnection::with_auto_close(
        serial_conn::port::SystemTransport::new(),
        config.serial.auto_close,
    );
    let simple = ConnectionConfig::with_simple_timeout(params.port.as_str(), timeout_ms);
    if *params == RawOpenParams::from(simple) {
        serial.open_with_timeout(&params.port, timeout_ms)?;
    } else {
        serial.open_raw(params)?;
    }

    let mut sent = 0;
    if !payload.is_empty() {
        sent = serial.write_bytes(payload)?;
        println!("sent {sent} of {} bytes", payload.len());
    }

    let wanted = read.unwrap_or(sent);
    if wanted > 0 {
        let reply = serial.read_bytes(wanted)?;
        if hex {
            let rendered: Vec<String> = reply.iter().map(|b| format!("{b:02X}")).collect();
            println!("received {} bytes: {}", reply.len(), rendered.join(" "));
        } else {
            println!(
                "received {} bytes: '{}'",
                reply.len(),
                String::from_utf8_lossy(&reply)
            );
        }
    }

    serial.close()?;
    Ok(())
}
