use std::process;

use clap::{Parser, Subcommand};

use soroquest_client::{
    created_quest_id, CancelToken, Config, CreateQuestParams, DistributionType, InvokeOutcome,
    PollConfig, Quest, QuestClient, QuestStats, QuestType, UserStats,
};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(name = "soroquest", about = "Quest Manager contract client for Soroban")]
#[command(version)]
struct Cli {
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Network name (testnet, mainnet, futurenet)
    #[arg(long, global = true, default_value = "testnet")]
    network: String,

    /// RPC endpoint URL (overrides STELLAR_RPC_URL env and network default)
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Contract address (overrides QUEST_MANAGER_CONTRACT_ID env)
    #[arg(long, global = true)]
    contract_id: Option<String>,

    /// Maximum seconds to wait for transaction confirmation
    #[arg(long, global = true, default_value_t = 300)]
    timeout: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a quest (admin)
    CreateQuest {
        /// Reward token contract address (overrides REWARD_TOKEN_ADDRESS env)
        #[arg(long)]
        reward_token: Option<String>,
        /// Reward paid to each winner, in token base units
        #[arg(long)]
        reward_per_winner: u128,
        /// Maximum number of winners
        #[arg(long)]
        max_winners: u32,
        /// Reward distribution: raffle or fcfs
        #[arg(long)]
        distribution: String,
        /// Quest kind: trade-volume, pool-position, or token-hold
        #[arg(long)]
        quest_type: String,
        /// Threshold amount for the quest kind
        #[arg(long)]
        amount: u128,
        /// Token to hold (token-hold quests only)
        #[arg(long)]
        token: Option<String>,
        /// Quest duration in seconds
        #[arg(long)]
        duration: u64,
        /// Total reward pool, in token base units
        #[arg(long)]
        reward_pool: u128,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Admin secret key (overrides ADMIN_SECRET_KEY env)
        #[arg(long)]
        secret_key: Option<String>,
        /// Output raw JSON instead of human-readable text
        #[arg(long)]
        json: bool,
    },
    /// Register the signing user for a quest
    Register {
        quest_id: u64,
        /// User secret key (overrides USER_SECRET_KEY env)
        #[arg(long)]
        secret_key: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Mark a registered user as reward-eligible (admin)
    MarkEligible {
        quest_id: u64,
        /// User account address (G...)
        user: String,
        #[arg(long)]
        secret_key: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Resolve a finished quest and select winners (admin)
    Resolve {
        quest_id: u64,
        #[arg(long)]
        secret_key: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Pay out rewards for a resolved quest (admin)
    Distribute {
        quest_id: u64,
        #[arg(long)]
        secret_key: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Deactivate a quest before resolution (admin)
    Cancel {
        quest_id: u64,
        #[arg(long)]
        secret_key: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Show a quest
    Get {
        quest_id: u64,
        #[arg(long)]
        json: bool,
    },
    /// List active quests
    Active {
        #[arg(long)]
        json: bool,
    },
    /// List registered participants of a quest
    Participants {
        quest_id: u64,
        #[arg(long)]
        json: bool,
    },
    /// List winners of a resolved quest
    Winners {
        quest_id: u64,
        #[arg(long)]
        json: bool,
    },
    /// Show participation counters for a quest
    Stats {
        quest_id: u64,
        #[arg(long)]
        json: bool,
    },
    /// Show a user's participation history
    UserStats {
        /// User account address (G...)
        user: String,
        #[arg(long)]
        json: bool,
    },
    /// List quest ids a user has registered for
    UserQuests {
        /// User account address (G...)
        user: String,
        #[arg(long)]
        json: bool,
    },
    /// Show the total number of quests ever created
    Counter {
        #[arg(long)]
        json: bool,
    },
    /// Check whether a user is registered for a quest
    IsRegistered {
        quest_id: u64,
        /// User account address (G...)
        user: String,
        #[arg(long)]
        json: bool,
    },
}

// ---------------------------------------------------------------------------
// ANSI helpers
// ---------------------------------------------------------------------------

struct Colors {
    red: &'static str,
    green: &'static str,
    yellow: &'static str,
    bold: &'static str,
    reset: &'static str,
}

const COLORS_ON: Colors = Colors {
    red: "\x1b[31m",
    green: "\x1b[32m",
    yellow: "\x1b[33m",
    bold: "\x1b[1m",
    reset: "\x1b[0m",
};

const COLORS_OFF: Colors = Colors {
    red: "",
    green: "",
    yellow: "",
    bold: "",
    reset: "",
};

fn choose_colors(no_color: bool) -> &'static Colors {
    if no_color {
        &COLORS_OFF
    } else {
        &COLORS_ON
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    let cli = Cli::parse();
    let c = choose_colors(cli.no_color);

    let mut config = load_config(&cli, c);

    match cli.command {
        Commands::CreateQuest {
            reward_token,
            reward_per_winner,
            max_winners,
            distribution,
            quest_type,
            amount,
            token,
            duration,
            reward_pool,
            title,
            description,
            secret_key,
            json,
        } => {
            // Everything local is validated before the client touches
            // the network.
            let distribution: DistributionType =
                distribution.parse().unwrap_or_else(|e| fail(&e, c));
            let quest_type = QuestType::from_parts(&quest_type, amount, token.as_deref())
                .unwrap_or_else(|e| fail(&e, c));
            let reward_token = reward_token
                .or_else(|| config.reward_token.clone())
                .unwrap_or_else(|| {
                    eprintln!(
                        "{}{}error{}: no reward token: use --reward-token or set REWARD_TOKEN_ADDRESS",
                        c.red, c.bold, c.reset
                    );
                    process::exit(1);
                });

            apply_secret(&mut config.admin_secret, secret_key, c);
            let client = make_client(config, cli.timeout);

            let params = CreateQuestParams {
                reward_token,
                reward_per_winner,
                max_winners,
                distribution,
                quest_type,
                duration_seconds: duration,
                reward_pool_amount: reward_pool,
                title,
                description,
            };

            let outcome = client
                .create_quest(&params, &CancelToken::new())
                .unwrap_or_else(|e| fail(&e, c));

            if !json {
                if let Ok(Some(id)) = created_quest_id(&outcome) {
                    println!("Created quest {}", id);
                }
            }
            finish_invoke(&outcome, json, &cli.network, c);
        }

        Commands::Register {
            quest_id,
            secret_key,
            json,
        } => {
            apply_secret(&mut config.user_secret, secret_key, c);
            let client = make_client(config, cli.timeout);
            let outcome = client
                .register(quest_id, &CancelToken::new())
                .unwrap_or_else(|e| fail(&e, c));
            finish_invoke(&outcome, json, &cli.network, c);
        }

        Commands::MarkEligible {
            quest_id,
            user,
            secret_key,
            json,
        } => {
            apply_secret(&mut config.admin_secret, secret_key, c);
            let client = make_client(config, cli.timeout);
            let outcome = client
                .mark_user_eligible(quest_id, &user, &CancelToken::new())
                .unwrap_or_else(|e| fail(&e, c));
            finish_invoke(&outcome, json, &cli.network, c);
        }

        Commands::Resolve {
            quest_id,
            secret_key,
            json,
        } => {
            apply_secret(&mut config.admin_secret, secret_key, c);
            let client = make_client(config, cli.timeout);
            let outcome = client
                .resolve_quest(quest_id, &CancelToken::new())
                .unwrap_or_else(|e| fail(&e, c));
            finish_invoke(&outcome, json, &cli.network, c);
        }

        Commands::Distribute {
            quest_id,
            secret_key,
            json,
        } => {
            apply_secret(&mut config.admin_secret, secret_key, c);
            let client = make_client(config, cli.timeout);
            let outcome = client
                .distribute_rewards(quest_id, &CancelToken::new())
                .unwrap_or_else(|e| fail(&e, c));
            finish_invoke(&outcome, json, &cli.network, c);
        }

        Commands::Cancel {
            quest_id,
            secret_key,
            json,
        } => {
            apply_secret(&mut config.admin_secret, secret_key, c);
            let client = make_client(config, cli.timeout);
            let outcome = client
                .cancel_quest(quest_id, &CancelToken::new())
                .unwrap_or_else(|e| fail(&e, c));
            finish_invoke(&outcome, json, &cli.network, c);
        }

        Commands::Get { quest_id, json } => {
            let client = make_client(config, cli.timeout);
            let quest = client.get_quest(quest_id).unwrap_or_else(|e| fail(&e, c));
            if json {
                print_json(&quest);
            } else {
                print!("{}", format_quest(&quest, c));
            }
        }

        Commands::Active { json } => {
            let client = make_client(config, cli.timeout);
            let quests = client.get_active_quests().unwrap_or_else(|e| fail(&e, c));
            if json {
                print_json(&quests);
            } else if quests.is_empty() {
                println!("No active quests.");
            } else {
                for quest in &quests {
                    print!("{}", format_quest(quest, c));
                }
            }
        }

        Commands::Participants { quest_id, json } => {
            let client = make_client(config, cli.timeout);
            let users = client
                .get_participants(quest_id)
                .unwrap_or_else(|e| fail(&e, c));
            print_address_list(&users, "participants", json);
        }

        Commands::Winners { quest_id, json } => {
            let client = make_client(config, cli.timeout);
            let users = client.get_winners(quest_id).unwrap_or_else(|e| fail(&e, c));
            print_address_list(&users, "winners", json);
        }

        Commands::Stats { quest_id, json } => {
            let client = make_client(config, cli.timeout);
            let stats = client
                .get_quest_stats(quest_id)
                .unwrap_or_else(|e| fail(&e, c));
            if json {
                print_json(&stats);
            } else {
                print!("{}", format_quest_stats(&stats));
            }
        }

        Commands::UserStats { user, json } => {
            let client = make_client(config, cli.timeout);
            let stats = client.get_user_stats(&user).unwrap_or_else(|e| fail(&e, c));
            if json {
                print_json(&stats);
            } else {
                print!("{}", format_user_stats(&stats));
            }
        }

        Commands::UserQuests { user, json } => {
            let client = make_client(config, cli.timeout);
            let ids = client.get_user_quests(&user).unwrap_or_else(|e| fail(&e, c));
            if json {
                print_json(&ids);
            } else if ids.is_empty() {
                println!("No quests.");
            } else {
                for id in &ids {
                    println!("{}", id);
                }
            }
        }

        Commands::Counter { json } => {
            let client = make_client(config, cli.timeout);
            let count = client.get_quest_counter().unwrap_or_else(|e| fail(&e, c));
            if json {
                print_json(&count);
            } else {
                println!("{}", count);
            }
        }

        Commands::IsRegistered {
            quest_id,
            user,
            json,
        } => {
            let client = make_client(config, cli.timeout);
            let registered = client
                .is_user_registered(quest_id, &user)
                .unwrap_or_else(|e| fail(&e, c));
            if json {
                print_json(&registered);
            } else {
                println!("{}", registered);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Setup helpers
// ---------------------------------------------------------------------------

fn load_config(cli: &Cli, c: &Colors) -> Config {
    Config::from_env(&cli.network, cli.rpc_url.as_deref(), cli.contract_id.as_deref())
        .unwrap_or_else(|e| fail(&e, c))
}

fn make_client(config: Config, timeout: u64) -> QuestClient {
    QuestClient::new(config).with_poll_config(PollConfig {
        deadline_seconds: timeout,
        ..PollConfig::default()
    })
}

/// Apply a --secret-key override on top of the env-provided credential.
fn apply_secret(slot: &mut Option<String>, explicit: Option<String>, c: &Colors) {
    if let Some(sk) = explicit {
        eprintln!(
            "{}warning{}: passing secret keys via CLI arguments may expose them in shell history",
            c.yellow, c.reset
        );
        *slot = Some(sk);
    }
}

fn fail(err: &dyn std::fmt::Display, c: &Colors) -> ! {
    eprintln!("{}{}error{}: {}", c.red, c.bold, c.reset, err);
    process::exit(1);
}

fn print_json<T: serde::Serialize>(value: &T) {
    let json = serde_json::to_string_pretty(value).expect("JSON serialization failed");
    println!("{}", json);
}

// ---------------------------------------------------------------------------
// Output formatting
// ---------------------------------------------------------------------------

/// Print the outcome of a submitted transaction and exit non-zero on failure.
fn finish_invoke(outcome: &InvokeOutcome, json: bool, network: &str, c: &Colors) {
    if json {
        print_json(outcome);
    } else {
        print!("{}", format_invoke_outcome(outcome, network, c));
    }
    if !outcome.is_confirmed() {
        process::exit(1);
    }
}

fn format_invoke_outcome(outcome: &InvokeOutcome, network: &str, c: &Colors) -> String {
    let mut out = String::new();

    match outcome {
        InvokeOutcome::Confirmed {
            tx_hash,
            ledger,
            fee_charged,
            return_value,
        } => {
            out.push_str(&format!(
                "  Status:      {}{}CONFIRMED{} (ledger: {})\n",
                c.green, c.bold, c.reset, ledger
            ));
            out.push_str(&format!("  Fee:         {} stroops\n", fee_charged));
            let ret = return_value.as_deref().unwrap_or("void");
            out.push_str(&format!("  Return:      {}\n", ret));
            out.push_str(&format!("  Transaction: {}\n", tx_hash));

            let explorer_net = match network {
                "mainnet" => "public",
                other => other,
            };
            out.push_str(&format!(
                "  Explorer:    https://stellar.expert/explorer/{}/tx/{}\n",
                explorer_net, tx_hash
            ));
        }
        InvokeOutcome::Failed {
            tx_hash,
            error,
            contract_error,
        } => {
            out.push_str(&format!(
                "  Status:      {}{}FAILED{}\n",
                c.red, c.bold, c.reset
            ));
            match contract_error {
                Some(e) => out.push_str(&format!("  Error:       {}\n", e)),
                None => out.push_str(&format!("  Error:       {}\n", error)),
            }
            if let Some(hash) = tx_hash {
                out.push_str(&format!("  Transaction: {}\n", hash));
            }
        }
    }

    out
}

fn format_quest(quest: &Quest, c: &Colors) -> String {
    let status = if quest.is_active {
        format!("{}active{}", c.green, c.reset)
    } else {
        format!("{}inactive{}", c.red, c.reset)
    };
    let mut out = format!(
        "{}Quest #{}{} [{}] {}\n",
        c.bold, quest.id, c.reset, status, quest.title
    );
    if !quest.description.is_empty() {
        out.push_str(&format!("  {}\n", quest.description));
    }
    out.push_str(&format!("  Admin:          {}\n", quest.admin));
    out.push_str(&format!(
        "  Task:           {:?}\n",
        quest.quest_type
    ));
    out.push_str(&format!("  Distribution:   {}\n", quest.distribution));
    out.push_str(&format!(
        "  Reward:         {} x {} (token {})\n",
        quest.reward_per_winner, quest.max_winners, quest.reward_token
    ));
    out.push_str(&format!("  Pool:           {}\n", quest.total_reward_pool));
    out.push_str(&format!("  Ends at:        {}\n", quest.end_timestamp));
    out
}

fn format_quest_stats(stats: &QuestStats) -> String {
    let mut out = format!("Quest #{}\n", stats.quest_id);
    out.push_str(&format!("  Registered:     {}\n", stats.total_registered));
    out.push_str(&format!("  Eligible:       {}\n", stats.total_eligible));
    out.push_str(&format!("  Winners:        {}\n", stats.total_winners));
    out.push_str(&format!("  Resolved:       {}\n", stats.is_resolved));
    out.push_str(&format!(
        "  Time remaining: {}s\n",
        stats.time_remaining
    ));
    out
}

fn format_user_stats(stats: &UserStats) -> String {
    let mut out = format!("  Participated:   {}\n", stats.total_participated);
    out.push_str(&format!("  Won:            {}\n", stats.total_won));
    out.push_str(&format!("  Total rewards:  {}\n", stats.total_rewards));
    out.push_str(&format!(
        "  Win rate:       {}.{:02}%\n",
        stats.win_rate / 100,
        stats.win_rate % 100
    ));
    out
}

fn print_address_list(users: &[String], label: &str, json: bool) {
    if json {
        print_json(&users);
    } else if users.is_empty() {
        println!("No {}.", label);
    } else {
        for user in users {
            println!("{}", user);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::process::Command;

    const CONTRACT: &str = "CAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAABSC4";

    fn cargo_bin() -> PathBuf {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.pop(); // crates/
        path.pop(); // project root
        path.push("target");
        path.push("debug");
        path.push("soroquest");
        path
    }

    fn build_binary() {
        let status = Command::new("cargo")
            .args(["build", "--bin", "soroquest"])
            .status()
            .expect("failed to build");
        assert!(status.success(), "cargo build failed");
    }

    /// Base command with a clean environment: no contract id, no keys, and
    /// an unroutable RPC endpoint so nothing can accidentally go out.
    fn soroquest(args: &[&str]) -> Command {
        let mut cmd = Command::new(cargo_bin());
        cmd.env_remove("QUEST_MANAGER_CONTRACT_ID")
            .env_remove("ADMIN_SECRET_KEY")
            .env_remove("USER_SECRET_KEY")
            .env_remove("REWARD_TOKEN_ADDRESS")
            .env_remove("STELLAR_RPC_URL")
            .args(args)
            .arg("--no-color")
            .args(["--rpc-url", "http://127.0.0.1:1"]);
        cmd
    }

    #[test]
    fn help_lists_subcommands() {
        build_binary();
        let output = Command::new(cargo_bin())
            .arg("--help")
            .output()
            .expect("failed to run");
        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        for cmd in ["create-quest", "register", "resolve", "is-registered"] {
            assert!(stdout.contains(cmd), "help should list {}", cmd);
        }
    }

    #[test]
    fn missing_contract_id_exits_1() {
        build_binary();
        let output = soroquest(&["counter"]).output().expect("failed to run");
        assert!(!output.status.success(), "should have exit code 1");
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(
            stderr.contains("QUEST_MANAGER_CONTRACT_ID"),
            "stderr: {}",
            stderr
        );
    }

    #[test]
    fn missing_admin_secret_exits_1_without_network() {
        build_binary();
        let output = soroquest(&["resolve", "1", "--contract-id", CONTRACT])
            .output()
            .expect("failed to run");
        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("ADMIN_SECRET_KEY"), "stderr: {}", stderr);
    }

    #[test]
    fn missing_user_secret_exits_1_without_network() {
        build_binary();
        let output = soroquest(&["register", "1", "--contract-id", CONTRACT])
            .output()
            .expect("failed to run");
        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("USER_SECRET_KEY"), "stderr: {}", stderr);
    }

    #[test]
    fn unknown_quest_type_rejected_locally() {
        build_binary();
        let output = soroquest(&[
            "create-quest",
            "--contract-id",
            CONTRACT,
            "--reward-token",
            CONTRACT,
            "--reward-per-winner",
            "100",
            "--max-winners",
            "5",
            "--distribution",
            "raffle",
            "--quest-type",
            "nft-mint",
            "--amount",
            "1",
            "--duration",
            "3600",
            "--reward-pool",
            "500",
            "--title",
            "t",
        ])
        .output()
        .expect("failed to run");
        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("nft-mint"), "stderr: {}", stderr);
    }

    #[test]
    fn unknown_distribution_rejected_locally() {
        build_binary();
        let output = soroquest(&[
            "create-quest",
            "--contract-id",
            CONTRACT,
            "--reward-token",
            CONTRACT,
            "--reward-per-winner",
            "100",
            "--max-winners",
            "5",
            "--distribution",
            "lottery",
            "--quest-type",
            "trade-volume",
            "--amount",
            "1",
            "--duration",
            "3600",
            "--reward-pool",
            "500",
            "--title",
            "t",
        ])
        .output()
        .expect("failed to run");
        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("lottery"), "stderr: {}", stderr);
    }

    #[test]
    fn unknown_network_exits_1() {
        build_binary();
        let output = Command::new(cargo_bin())
            .env_remove("STELLAR_RPC_URL")
            .args(["counter", "--network", "localnet", "--contract-id", CONTRACT])
            .arg("--no-color")
            .output()
            .expect("failed to run");
        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("localnet"), "stderr: {}", stderr);
    }
}
