use std::error::Error;

use clap::{Args, Parser, Subcommand};
use engine::{Engine, GroupId, MemberId, MoneyCents, NewExpenseCmd, NewGroupCmd, Share};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use server::JwtVerifier;

#[derive(Parser, Debug)]
#[command(name = "splitledger_admin")]
#[command(about = "Admin utilities for SplitLedger (bootstrap members/groups)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./splitledger.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Member(Member),
    Group(Group),
    Expense(Expense),
}

#[derive(Args, Debug)]
struct Member {
    #[command(subcommand)]
    command: MemberCommand,
}

#[derive(Subcommand, Debug)]
enum MemberCommand {
    Create(MemberCreateArgs),
    List,
    /// Sign a bearer token for an existing member.
    Token(MemberTokenArgs),
}

#[derive(Args, Debug)]
struct MemberCreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: Option<String>,
}

#[derive(Args, Debug)]
struct MemberTokenArgs {
    #[arg(long)]
    id: MemberId,
    /// Must match `server.jwt_secret` of the running server.
    #[arg(long, env = "SPLITLEDGER__SERVER__JWT_SECRET")]
    secret: String,
}

#[derive(Args, Debug)]
struct Group {
    #[command(subcommand)]
    command: GroupCommand,
}

#[derive(Subcommand, Debug)]
enum GroupCommand {
    Create(GroupCreateArgs),
    /// Print balances and the settlement plan of a group.
    Settle(GroupSettleArgs),
}

#[derive(Args, Debug)]
struct GroupCreateArgs {
    #[arg(long)]
    name: String,
    /// Member ids, comma separated.
    #[arg(long, value_delimiter = ',', required = true)]
    members: Vec<MemberId>,
}

#[derive(Args, Debug)]
struct GroupSettleArgs {
    #[arg(long)]
    id: GroupId,
}

#[derive(Args, Debug)]
struct Expense {
    #[command(subcommand)]
    command: ExpenseCommand,
}

#[derive(Subcommand, Debug)]
enum ExpenseCommand {
    /// Record an expense paid by one member and split evenly.
    Add(ExpenseAddArgs),
}

#[derive(Args, Debug)]
struct ExpenseAddArgs {
    #[arg(long)]
    group: GroupId,
    /// Member recorded as the author of the change.
    #[arg(long)]
    actor: MemberId,
    #[arg(long)]
    description: String,
    /// Decimal amount, e.g. `12.50`.
    #[arg(long)]
    amount: MoneyCents,
    #[arg(long)]
    payer: MemberId,
    /// Members sharing the cost, comma separated.
    #[arg(long, value_delimiter = ',', required = true)]
    split: Vec<MemberId>,
}

/// Splits `amount` evenly; leftover cents go to the first members.
fn even_split(amount: MoneyCents, members: &[MemberId]) -> Vec<Share> {
    let Ok(count) = i64::try_from(members.len()) else {
        return Vec::new();
    };
    if count == 0 {
        return Vec::new();
    }
    let base = amount.cents() / count;
    let mut leftover = amount.cents() % count;
    members
        .iter()
        .map(|&member_id| {
            let extra = i64::from(leftover > 0);
            leftover -= extra;
            Share::new(member_id, base + extra)
        })
        .collect()
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Member(Member {
            command: MemberCommand::Create(args),
        }) => {
            let member = engine.new_member(&args.name, args.email.as_deref()).await?;
            println!("created member: {} ({})", member.name, member.id);
        }
        Command::Member(Member {
            command: MemberCommand::List,
        }) => {
            for member in engine.list_members().await? {
                println!(
                    "{:>6}  {:<24} {}{}",
                    member.id,
                    member.name,
                    member.email.as_deref().unwrap_or("-"),
                    if member.registered { "" } else { " (invited)" }
                );
            }
        }
        Command::Member(Member {
            command: MemberCommand::Token(args),
        }) => {
            let member = engine.member(args.id).await?;
            let token = JwtVerifier::new(&args.secret).issue(member.id)?;
            println!("{token}");
        }
        Command::Group(Group {
            command: GroupCommand::Create(args),
        }) => {
            let group = engine
                .create_group(NewGroupCmd::new(&args.name, args.members))
                .await?;
            println!("created group: {} ({})", group.name, group.id);
        }
        Command::Group(Group {
            command: GroupCommand::Settle(args),
        }) => {
            let group = engine.group(args.id).await?;
            let name_of = |id: MemberId| {
                group
                    .members
                    .iter()
                    .find(|m| m.id == id)
                    .map_or_else(|| format!("#{id}"), |m| m.name.clone())
            };

            println!("balances for {}:", group.name);
            for balance in engine.balances(group.id).await? {
                println!(
                    "  {:<24} paid {:>10}  owes {:>10}  net {:>10}",
                    name_of(balance.member_id),
                    balance.paid,
                    balance.owed,
                    balance.balance
                );
            }

            let plan = engine.settlements(group.id).await?;
            if plan.is_empty() {
                println!("all settled");
            }
            for settlement in plan {
                println!(
                    "  {} -> {}: {}",
                    name_of(settlement.from),
                    name_of(settlement.to),
                    settlement.amount
                );
            }
        }
        Command::Expense(Expense {
            command: ExpenseCommand::Add(args),
        }) => {
            let cmd = NewExpenseCmd::new(args.group, args.actor, args.description, args.amount)
                .payer(args.payer, args.amount)
                .splits(even_split(args.amount, &args.split));
            let expense = engine.create_expense(cmd).await?;
            println!("created expense: {} ({})", expense.description, expense.id);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn even_split_hands_out_leftover_cents() {
        let shares = even_split(MoneyCents::new(1000), &[1, 2, 3]);
        let amounts: Vec<i64> = shares.iter().map(|s| s.amount.cents()).collect();
        assert_eq!(amounts, vec![334, 333, 333]);
        assert!(even_split(MoneyCents::new(1000), &[]).is_empty());
    }
}
