use std::process;
use std::time::Duration;

use atelier::cli::{
    AssetCommands, ChecklistCommands, Cli, Commands, CommentCommands, ConfigCommands,
    DeliveryCommands, NotificationCommands, RfqCommands, SectionCommands, StageCommands,
    TeamCommands, UpdateCommands,
};
use atelier::client::{ApiClient, UploadTarget};
use atelier::commands::{self, Output};
use atelier::config::{ConfigOverrides, ConfigStore, OutputFormat, ResolvedConfig, resolve};
use atelier::models::NewDelivery;
use atelier::toast::ToastCenter;
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    atelier::logging::init(cli.verbose);

    let mut human = cli.human_readable;
    let mut toasts = ToastCenter::new();

    let result = run(cli, &mut human, &mut toasts).await;

    // Toasts are a human-mode surface; JSON output already carries the outcome
    let failure = match &result {
        Err(e) if human => Some(toasts.report(e)),
        Err(e) => {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
            None
        }
        Ok(()) => None,
    };

    if human {
        for toast in toasts.drain() {
            if Some(toast.id) == failure {
                eprintln!("Error: {}", toast.message);
            } else {
                eprintln!("{}", toast);
            }
        }
    }

    if result.is_err() {
        process::exit(1);
    }
}

fn overrides(cli: &Cli) -> ConfigOverrides {
    ConfigOverrides {
        api_url: cli.api_url.clone(),
        api_token: cli.token.clone(),
        output_format: cli.human_readable.then_some(OutputFormat::Human),
    }
}

async fn run(cli: Cli, human: &mut bool, toasts: &mut ToastCenter) -> Result<(), atelier::Error> {
    let store = ConfigStore::from_env()?;

    // `config set` must work even when the stored config no longer resolves
    if let Commands::Config {
        command: ConfigCommands::Set { key, value },
    } = &cli.command
    {
        output(&commands::config_set(&store, key, value)?, *human);
        return Ok(());
    }

    let settings = resolve(&store, &overrides(&cli))?;
    *human = settings.human();
    run_command(cli.command, &store, &settings, *human, toasts).await
}

fn client(settings: &ResolvedConfig) -> Result<ApiClient, atelier::Error> {
    Ok(ApiClient::new(
        settings.api_url(),
        settings.token().map(str::to_string),
    )?)
}

async fn run_command(
    command: Commands,
    store: &ConfigStore,
    settings: &ResolvedConfig,
    human: bool,
    toasts: &mut ToastCenter,
) -> Result<(), atelier::Error> {
    match command {
        Commands::Section { command } => {
            let client = client(settings)?;
            match command {
                SectionCommands::List { stage_id } => {
                    output(&commands::section_list(&client, &stage_id).await?, human)
                }
                SectionCommands::Ensure {
                    stage_id,
                    section_type,
                } => output(
                    &commands::section_ensure(&client, &stage_id, section_type).await?,
                    human,
                ),
                SectionCommands::Notes { section_id, notes } => output(
                    &commands::section_notes(&client, &section_id, &notes).await?,
                    human,
                ),
                SectionCommands::Status { section_id, status } => output(
                    &commands::section_status(&client, &section_id, status).await?,
                    human,
                ),
                SectionCommands::Complete { section_id, reopen } => output(
                    &commands::section_complete(&client, &section_id, !reopen).await?,
                    human,
                ),
            }
        }

        Commands::Comment { command } => {
            let client = client(settings)?;
            match command {
                CommentCommands::List { section_id } => {
                    output(&commands::comment_list(&client, &section_id).await?, human)
                }
                CommentCommands::Add {
                    section_id,
                    content,
                    parent,
                } => output(
                    &commands::comment_add(&client, &section_id, &content, parent).await?,
                    human,
                ),
                CommentCommands::Edit {
                    comment_id,
                    content,
                } => output(
                    &commands::comment_edit(&client, &comment_id, &content).await?,
                    human,
                ),
                CommentCommands::Like { comment_id } => {
                    output(&commands::comment_like(&client, &comment_id).await?, human)
                }
                CommentCommands::Pin { comment_id } => {
                    output(&commands::comment_pin(&client, &comment_id).await?, human)
                }
                CommentCommands::Delete { comment_id } => {
                    output(&commands::comment_delete(&client, &comment_id).await?, human)
                }
                CommentCommands::Watch {
                    section_id,
                    interval,
                } => {
                    let interval = Duration::from_secs(
                        interval.unwrap_or(atelier::poller::DEFAULT_WORKSPACE_INTERVAL_SECS),
                    );
                    if human {
                        eprintln!(
                            "Watching {} every {}s (Ctrl+C to stop)",
                            section_id,
                            interval.as_secs()
                        );
                    }
                    commands::comment_watch(&client, &section_id, interval, |thread| {
                        output(thread, human)
                    })
                    .await?;
                }
            }
        }

        Commands::Asset { command } => {
            let client = client(settings)?;
            match command {
                AssetCommands::Upload {
                    section_id,
                    files,
                    blob,
                } => {
                    let target = if blob {
                        UploadTarget::Blob
                    } else {
                        UploadTarget::Server
                    };
                    let summary =
                        commands::asset_upload(&client, &section_id, files, target, toasts).await;
                    output(&summary, human);
                }
                AssetCommands::Caption { asset_id, caption } => output(
                    &commands::asset_caption(&client, &asset_id, &caption).await?,
                    human,
                ),
                AssetCommands::Delete { asset_ids } => {
                    let summary = commands::asset_delete(&client, asset_ids, toasts).await;
                    output(&summary, human);
                }
            }
        }

        Commands::Notification { command } => {
            let client = client(settings)?;
            match command {
                NotificationCommands::List { unread } => {
                    output(&commands::notification_list(&client, unread).await?, human)
                }
                NotificationCommands::Read { notification_id } => output(
                    &commands::notification_read(&client, &notification_id).await?,
                    human,
                ),
                NotificationCommands::Watch { interval } => {
                    let interval = interval
                        .map(Duration::from_secs)
                        .unwrap_or_else(|| settings.poll_interval());
                    if human {
                        eprintln!(
                            "Watching notifications every {}s (Ctrl+C to stop)",
                            interval.as_secs()
                        );
                    }
                    let delivered =
                        commands::notification_watch(&client, interval, |n| output(n, human))
                            .await?;
                    if human {
                        toasts.info(format!("Received {} notification(s)", delivered));
                    }
                }
            }
        }

        Commands::Stage { command } => {
            let client = client(settings)?;
            match command {
                StageCommands::Show { stage_id } => {
                    output(&commands::stage_show(&client, &stage_id).await?, human)
                }
                StageCommands::Status { stage_id, status } => output(
                    &commands::stage_status(&client, &stage_id, status).await?,
                    human,
                ),
            }
        }

        Commands::Checklist { command } => {
            let client = client(settings)?;
            match command {
                ChecklistCommands::List { stage_id } => {
                    output(&commands::checklist_list(&client, &stage_id).await?, human)
                }
                ChecklistCommands::Toggle { stage_id, item_id } => output(
                    &commands::checklist_toggle(&client, &stage_id, &item_id, toasts).await?,
                    human,
                ),
                ChecklistCommands::Move {
                    stage_id,
                    item_id,
                    position,
                } => output(
                    &commands::checklist_move(&client, &stage_id, &item_id, position, toasts)
                        .await?,
                    human,
                ),
            }
        }

        Commands::Update { command } => {
            let client = client(settings)?;
            match command {
                UpdateCommands::List { project_id } => {
                    output(&commands::update_list(&client, &project_id).await?, human)
                }
                UpdateCommands::Post {
                    project_id,
                    content,
                } => output(
                    &commands::update_post(&client, &project_id, &content).await?,
                    human,
                ),
            }
        }

        Commands::Delivery { command } => {
            let client = client(settings)?;
            match command {
                DeliveryCommands::List { project, status } => output(
                    &commands::delivery_list(&client, project.as_deref(), status).await?,
                    human,
                ),
                DeliveryCommands::Create {
                    project_id,
                    item_name,
                    supplier,
                    tracking,
                    expected,
                } => {
                    let delivery = NewDelivery {
                        project_id,
                        item_name,
                        supplier,
                        tracking_number: tracking,
                        expected_date: expected,
                    };
                    output(&commands::delivery_create(&client, delivery).await?, human)
                }
                DeliveryCommands::Update {
                    delivery_id,
                    status,
                    tracking,
                    expected,
                    delivered,
                    notes,
                } => {
                    let patch = commands::delivery_patch(status, tracking, expected, delivered, notes);
                    output(
                        &commands::delivery_update(&client, &delivery_id, patch).await?,
                        human,
                    )
                }
            }
        }

        Commands::Rfq { command } => {
            let client = client(settings)?;
            match command {
                RfqCommands::List => output(&commands::rfq_list(&client).await?, human),
                RfqCommands::Send {
                    suppliers,
                    items,
                    project,
                    message,
                } => {
                    let summary =
                        commands::rfq_send(&client, suppliers, items, project, message, toasts)
                            .await?;
                    output(&summary, human);
                }
            }
        }

        Commands::Team { command } => {
            let client = client(settings)?;
            match command {
                TeamCommands::List => output(&commands::team_list(&client).await?, human),
            }
        }

        Commands::Thread { input } => output(&commands::thread(&input)?, human),

        Commands::Mentions { text, roster } => {
            output(&commands::mentions(&text, &roster)?, human)
        }

        Commands::Config { command } => match command {
            ConfigCommands::Show => output(&commands::config_show(store, settings), human),
            ConfigCommands::Set { key, value } => {
                output(&commands::config_set(store, &key, &value)?, human)
            }
        },
    }

    Ok(())
}

fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
