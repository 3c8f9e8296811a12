use clap::{Parser, Subcommand};
use near_da_client::commitment::{decode_commitment, decode_da_commitment, encode_commitment};
use near_da_client::config::{ConfigureRequest, Network, SidecarConfig, DEFAULT_SIDECAR_HOST};
use near_da_client::client::sidecar::SidecarClient;
use near_da_client::{BlobRef, DaBackend, DaClient, FrameRef, Namespace, Reference, ReferenceKind, SubmitOutcome, SENTINEL_CANDIDATE};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "near-da", about = "NEAR DA reference codec and sidecar client")]
struct Cli {
    /// Sidecar base URL
    #[arg(long, global = true, default_value = DEFAULT_SIDECAR_HOST)]
    host: String,
    /// JSON sidecar config; overrides --host
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the sidecar is up
    Health,
    /// Bind the sidecar to an account, contract and network
    Configure {
        #[arg(long)]
        account_id: String,
        #[arg(long)]
        secret_key: String,
        #[arg(long)]
        contract_id: String,
        /// mainnet, testnet or localnet
        #[arg(long, default_value = "testnet")]
        network: String,
        #[arg(long, default_value = "0")]
        namespace_version: u8,
        #[arg(long, default_value = "1")]
        namespace_id: u32,
    },
    /// Submit a file; prints the reference (hex) or reports pass-through
    Submit {
        #[arg(short, long)]
        input: PathBuf,
        /// Routing candidate address
        #[arg(long, default_value = SENTINEL_CANDIDATE)]
        candidate: String,
        /// Reference layout: frame (legacy, 64 B) or blob (compact, 32 B)
        #[arg(long)]
        kind: Option<String>,
        /// Print an altDA generic commitment instead of a reference
        #[arg(long)]
        altda: bool,
    },
    /// Fetch the blob behind a hex reference
    Get {
        reference: String,
        #[arg(long)]
        kind: Option<String>,
        /// Treat the input as an altDA generic commitment
        #[arg(long)]
        altda: bool,
        #[arg(long, default_value = "0")]
        index: u32,
        /// Write the blob here instead of printing hex
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Encode or decode references locally
    Ref {
        #[command(subcommand)]
        command: RefCommands,
    },
    /// Encode or decode altDA commitments locally
    Commitment {
        #[command(subcommand)]
        command: CommitmentCommands,
    },
}

#[derive(Subcommand)]
enum RefCommands {
    /// Build a reference; with --commitment it is a 64-byte frame reference
    Encode {
        #[arg(long)]
        tx_id: String,
        #[arg(long)]
        commitment: Option<String>,
    },
    Decode {
        reference: String,
        #[arg(long, default_value = "frame")]
        kind: String,
    },
}

#[derive(Subcommand)]
enum CommitmentCommands {
    /// Prefix a hex payload with the generic commitment type
    Encode { payload: String },
    /// Print the payload of a generic commitment and the tx ids it names
    Decode { commitment: String },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .compact()
        .init();

    let cli = Cli::parse();
    let sidecar_config = || -> Result<SidecarConfig, Box<dyn std::error::Error>> {
        Ok(match &cli.config {
            Some(path) => SidecarConfig::from_file(path)?,
            None       => SidecarConfig::new(&cli.host)?,
        })
    };

    match cli.command {

        // ── Health ───────────────────────────────────────────────────────────
        Commands::Health => {
            let cfg = sidecar_config()?;
            SidecarClient::new(&cfg)?.health()?;
            println!("Sidecar at {} is healthy", cfg.host);
        }

        // ── Configure ────────────────────────────────────────────────────────
        Commands::Configure { account_id, secret_key, contract_id, network, namespace_version, namespace_id } => {
            let request = ConfigureRequest {
                account_id,
                secret_key,
                contract_id,
                network:   network.parse::<Network>()?,
                namespace: Namespace::new(namespace_version, namespace_id),
            };
            let cfg = sidecar_config()?;
            SidecarClient::new(&cfg)?.configure(Some(&request))?;
            println!("Configured sidecar at {} for {} on {}", cfg.host, request.contract_id, request.network);
        }

        // ── Submit ───────────────────────────────────────────────────────────
        Commands::Submit { input, candidate, kind, altda } => {
            let mut cfg = sidecar_config()?;
            if let Some(kind) = kind {
                cfg.reference_kind = parse_kind(&kind)?;
            }
            let mut client = DaClient::sidecar(&cfg)?;
            let data = std::fs::read(&input)?;
            if altda {
                println!("{}", hex::encode(client.submit_altda(&data)?));
            } else {
                match client.submit(&candidate, &data)? {
                    SubmitOutcome::Reference(r) => println!("{}", hex::encode(r.encode())),
                    SubmitOutcome::PassThrough(_) => {
                        eprintln!("Data not submitted to DA (pass-through), {} bytes unchanged", data.len());
                    }
                }
            }
            client.close();
        }

        // ── Get ──────────────────────────────────────────────────────────────
        Commands::Get { reference, kind, altda, index, output } => {
            let mut cfg = sidecar_config()?;
            if let Some(kind) = kind {
                cfg.reference_kind = parse_kind(&kind)?;
            }
            let mut client = DaClient::sidecar(&cfg)?;
            let bytes = decode_hex(&reference)?;
            let data = if altda { client.get_altda(&bytes)? } else { client.get(&bytes, index)? };
            client.close();
            match output {
                Some(path) => {
                    std::fs::write(&path, &data)?;
                    println!("Wrote {} bytes to {}", data.len(), path.display());
                }
                None => println!("{}", hex::encode(&data)),
            }
        }

        // ── Ref ──────────────────────────────────────────────────────────────
        Commands::Ref { command: RefCommands::Encode { tx_id, commitment } } => {
            let tx_id = decode_array(&tx_id)?;
            let reference = match commitment {
                Some(c) => Reference::Frame(FrameRef::new(tx_id, decode_array(&c)?)),
                None    => Reference::Blob(BlobRef::new(tx_id)),
            };
            println!("{}", hex::encode(reference.encode()));
        }
        Commands::Ref { command: RefCommands::Decode { reference, kind } } => {
            match parse_kind(&kind)?.decode(&decode_hex(&reference)?)? {
                Reference::Frame(f) => {
                    println!("kind        frame");
                    println!("tx_id       {}", hex::encode(f.tx_id));
                    println!("commitment  {}", hex::encode(f.commitment));
                }
                Reference::Blob(b) => {
                    println!("kind        blob");
                    println!("tx_id       {}", b.id_hex());
                }
            }
        }

        // ── Commitment ───────────────────────────────────────────────────────
        Commands::Commitment { command: CommitmentCommands::Encode { payload } } => {
            println!("{}", hex::encode(encode_commitment(&decode_hex(&payload)?)));
        }
        Commands::Commitment { command: CommitmentCommands::Decode { commitment } } => {
            let bytes = decode_hex(&commitment)?;
            match decode_commitment(&bytes) {
                None => println!("Not a generic commitment"),
                Some(payload) => {
                    println!("payload     {}", hex::encode(payload));
                    if let Ok(refs) = decode_da_commitment(&bytes) {
                        for r in refs {
                            println!("tx_id       {}", r.id_hex());
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

// ── helpers ──────────────────────────────────────────────────────────────────

fn parse_kind(s: &str) -> Result<ReferenceKind, Box<dyn std::error::Error>> {
    ReferenceKind::from_name(s).ok_or_else(|| format!("unknown reference kind '{s}' (frame or blob)").into())
}

fn decode_hex(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(s.strip_prefix("0x").unwrap_or(s))
}

fn decode_array(s: &str) -> Result<[u8; 32], Box<dyn std::error::Error>> {
    let bytes = decode_hex(s)?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| format!("expected 32 bytes, got {}", bytes.len()).into())
}
