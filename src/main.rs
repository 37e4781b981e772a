use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use sqlx::PgPool;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use msosihub::config::{AppConfig, DEFAULT_SAVED_PLAN_LIMIT};
use msosihub::db::{self, PgIngredientResolver};
use msosihub::export::calendar::{anchor_from_date, week_start};
use msosihub::export::ExportFormat;
use msosihub::ingredient_parser::parse_ingredient_line;
use msosihub::localization::Localizer;
use msosihub::meal_plan::{DayOfWeek, DishName, MealCategory, MealPlan, Slot, SlotEdit};
use msosihub::notification::{Notice, NoticeLevel, NotificationSink};
use msosihub::planner::MealPlanEngine;
use msosihub::presenter;
use msosihub::resolver::{HttpIngredientResolver, IngredientResolver};

/// msosihub - Kenyan meal plan shopping lists and exports
#[derive(Parser)]
#[command(name = "msosihub")]
#[command(about = "Shopping lists and calendar exports for weekly meal plans", long_about = None)]
struct Cli {
    /// Locale for messages (overrides MSOSIHUB_LOCALE)
    #[arg(long, global = true)]
    locale: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse ingredient lines and show the structured result
    Parse {
        #[arg(required = true)]
        lines: Vec<String>,
    },
    /// Build the shopping list for a meal plan file
    ShoppingList {
        /// Meal plan JSON file
        #[arg(long)]
        plan: PathBuf,
    },
    /// Export a meal plan file
    Export {
        #[arg(long)]
        plan: PathBuf,

        /// ics, print, text, whatsapp or email
        #[arg(long)]
        format: ExportFormat,

        /// Date of Monday's slot (default: Monday of the current week)
        #[arg(long)]
        anchor: Option<NaiveDate>,

        /// Write the document here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// List recipes to pick dishes from (requires DATABASE_URL)
    Dishes {
        /// Only recipes in this category, e.g. Breakfast
        #[arg(long)]
        category: Option<String>,
    },
    /// Edit meal plan files and manage saved plans
    Plans {
        #[command(subcommand)]
        action: PlanCommand,
    },
    /// Store a recipe's ingredient lines (requires DATABASE_URL)
    AddRecipe {
        #[arg(long)]
        name: String,

        #[arg(long)]
        category: Option<String>,

        /// One ingredient line per occurrence
        #[arg(long = "ingredient")]
        ingredients: Vec<String>,
    },
}

/// The plan an edit reads from and writes back to
#[derive(Args)]
struct PlanTarget {
    /// Meal plan JSON file, rewritten in place (started empty when missing)
    #[arg(long, conflicts_with = "id", required_unless_present = "id")]
    file: Option<PathBuf>,

    /// Saved plan ID (requires DATABASE_URL)
    #[arg(long, requires = "user")]
    id: Option<i64>,

    /// Owner of the saved plan
    #[arg(long)]
    user: Option<String>,
}

#[derive(Subcommand)]
enum PlanCommand {
    /// Start a plan file, empty or copied from a saved plan
    New {
        #[arg(long)]
        output: PathBuf,

        /// Saved plan ID to copy
        #[arg(long)]
        from: Option<i64>,
    },
    /// Put a dish in a slot
    Assign {
        #[arg(long)]
        day: DayOfWeek,
        #[arg(long)]
        meal: MealCategory,
        #[arg(long)]
        dish: String,
        #[command(flatten)]
        target: PlanTarget,
    },
    /// Empty a slot
    Clear {
        #[arg(long)]
        day: DayOfWeek,
        #[arg(long)]
        meal: MealCategory,
        #[command(flatten)]
        target: PlanTarget,
    },
    /// Save a meal plan file for a user (requires DATABASE_URL)
    Save {
        #[arg(long)]
        user: String,
        #[arg(long)]
        plan: PathBuf,
    },
    /// List a user's most recent plans
    List {
        #[arg(long)]
        user: String,
        #[arg(long, default_value_t = DEFAULT_SAVED_PLAN_LIMIT)]
        limit: i64,
    },
    /// Print a saved plan as JSON
    Show { id: i64 },
    /// Replace a saved plan
    Update {
        id: i64,
        #[arg(long)]
        user: String,
        #[arg(long)]
        plan: PathBuf,
    },
    /// Delete a saved plan
    Delete {
        id: i64,
        #[arg(long)]
        user: String,
    },
}

/// Prints notices for the person at the terminal
struct ConsoleSink;

impl NotificationSink for ConsoleSink {
    fn notify(&self, notice: Notice) {
        let marker = match notice.level {
            NoticeLevel::Success => "✅",
            NoticeLevel::Info => "ℹ️",
            NoticeLevel::Warning => "⚠️",
            NoticeLevel::Error => "❌",
        };
        eprintln!("{} {}: {}", marker, notice.title, notice.description);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = env::var("MSOSIHUB_LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let mut config = AppConfig::from_env()?;
    if let Some(locale) = cli.locale {
        config.locale = locale;
    }
    let localizer = Localizer::new(&config.locale)?;

    match cli.command {
        Commands::Parse { lines } => parse_command(&lines),
        Commands::ShoppingList { plan } => shopping_list_command(&config, &localizer, &plan).await,
        Commands::Export {
            plan,
            format,
            anchor,
            output,
        } => export_command(&config, &localizer, &plan, format, anchor, output.as_deref()).await,
        Commands::Dishes { category } => dishes_command(&config, &localizer, category.as_deref()).await,
        Commands::Plans { action } => plans_command(&config, &localizer, action).await,
        Commands::AddRecipe {
            name,
            category,
            ingredients,
        } => {
            let pool = connect(&config).await?;
            let id = db::create_recipe(&pool, &name, category.as_deref(), &ingredients).await?;
            println!("{}", id);
            Ok(())
        }
    }
}

fn parse_command(lines: &[String]) -> Result<()> {
    for line in lines {
        let parsed = parse_ingredient_line(line);
        println!("{}", serde_json::to_string(&parsed)?);
    }
    Ok(())
}

fn load_plan(path: &Path) -> Result<MealPlan> {
    let raw = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let value: Value =
        serde_json::from_str(&raw).with_context(|| format!("{} is not valid JSON", path.display()))?;

    let (plan, ignored) = MealPlan::from_value_lenient(&value);
    if !ignored.is_empty() {
        warn!(path = %path.display(), ignored = ?ignored, "Meal plan file had entries that were skipped");
    }
    info!(path = %path.display(), slots = plan.filled_slots(), "Loaded meal plan");
    Ok(plan)
}

async fn connect(config: &AppConfig) -> Result<PgPool> {
    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL must be set")?;
    let pool = PgPool::connect(database_url)
        .await
        .context("Failed to connect to database")?;
    db::init_database_schema(&pool).await?;
    Ok(pool)
}

async fn build_resolver(config: &AppConfig) -> Result<Box<dyn IngredientResolver>> {
    if config.database_url.is_some() {
        info!("Resolving dishes from the recipes table");
        Ok(Box::new(PgIngredientResolver::new(connect(config).await?)))
    } else {
        info!(api_url = %config.api_url, "Resolving dishes through the recipe API");
        Ok(Box::new(HttpIngredientResolver::new(
            &config.api_url,
            config.recovery.clone(),
        )?))
    }
}

async fn shopping_list_command(config: &AppConfig, localizer: &Localizer, path: &Path) -> Result<()> {
    let plan = load_plan(path)?;
    let resolver = build_resolver(config).await?;
    let engine = MealPlanEngine::new(resolver.as_ref(), &ConsoleSink, localizer)
        .with_recovery(config.recovery.clone());

    let report = engine.generate_shopping_list(&plan).await;
    print!(
        "{}",
        presenter::render_text(&report.list, &localizer.t("shopping-list-untotalled-heading"))
    );
    Ok(())
}

async fn export_command(
    config: &AppConfig,
    localizer: &Localizer,
    path: &Path,
    format: ExportFormat,
    anchor: Option<NaiveDate>,
    output: Option<&Path>,
) -> Result<()> {
    let plan = load_plan(path)?;
    let resolver = build_resolver(config).await?;
    let engine = MealPlanEngine::new(resolver.as_ref(), &ConsoleSink, localizer)
        .with_recovery(config.recovery.clone())
        .with_product_id(&config.calendar_product_id);

    let anchor = anchor_from_date(anchor.unwrap_or_else(|| week_start(Utc::now().date_naive())));
    let document = match output {
        Some(output) => engine.export_to_file(&plan, format, anchor, output).await?,
        None => {
            let document = engine.export(&plan, format, anchor).await?;
            print!("{}", document.content);
            document
        }
    };

    if let Some(link) = &document.link {
        println!("{}", link);
    }
    Ok(())
}

fn notify_success(localizer: &Localizer, description: String) {
    ConsoleSink.notify(Notice::new(NoticeLevel::Success, localizer.t("notice-success"), description));
}

fn notify_plan_not_found(localizer: &Localizer) {
    ConsoleSink.notify(Notice::new(
        NoticeLevel::Error,
        localizer.t("notice-error"),
        localizer.t("plan-not-found"),
    ));
}

fn write_plan(path: &Path, plan: &MealPlan) -> Result<()> {
    fs::write(path, plan.to_json_pretty()? + "\n")
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), slots = plan.filled_slots(), "Wrote meal plan");
    Ok(())
}

async fn dishes_command(config: &AppConfig, localizer: &Localizer, category: Option<&str>) -> Result<()> {
    let pool = connect(config).await?;
    let recipes = db::list_recipes(&pool, category).await?;
    if recipes.is_empty() {
        ConsoleSink.notify(Notice::new(
            NoticeLevel::Warning,
            localizer.t("notice-warning"),
            localizer.t("dishes-none"),
        ));
    }
    for recipe in recipes {
        println!("{}\t{}", recipe.recipe_name, recipe.category.unwrap_or_default());
    }
    Ok(())
}

async fn edit_plan_command(
    config: &AppConfig,
    localizer: &Localizer,
    edit: SlotEdit,
    target: PlanTarget,
) -> Result<()> {
    let slot = edit.slot();
    let description = match &edit {
        SlotEdit::Assign(_, dish) => localizer.t_args(
            "meal-assigned",
            &[("dish", dish.as_str()), ("day", slot.day.as_str()), ("meal", slot.category.as_str())],
        ),
        SlotEdit::Clear(_) => localizer.t_args(
            "meal-cleared",
            &[("day", slot.day.as_str()), ("meal", slot.category.as_str())],
        ),
    };

    match (target.file, target.id, target.user) {
        (Some(path), _, _) => {
            let mut plan = if path.exists() {
                load_plan(&path)?
            } else {
                MealPlan::new()
            };
            plan.apply(edit);
            write_plan(&path, &plan)?;
        }
        (None, Some(id), Some(user)) => {
            let pool = connect(config).await?;
            let Some(saved) = db::read_meal_plan(&pool, id).await?.filter(|saved| saved.user_id == user) else {
                notify_plan_not_found(localizer);
                return Ok(());
            };
            let mut plan = saved.plan;
            plan.apply(edit);
            if db::update_meal_plan(&pool, id, &user, &plan).await?.is_none() {
                notify_plan_not_found(localizer);
                return Ok(());
            }
        }
        _ => anyhow::bail!("Pass --file, or --id together with --user"),
    }

    notify_success(localizer, description);
    Ok(())
}

async fn new_plan_command(
    config: &AppConfig,
    localizer: &Localizer,
    output: &Path,
    from: Option<i64>,
) -> Result<()> {
    let plan = match from {
        Some(id) => {
            let pool = connect(config).await?;
            match db::read_meal_plan(&pool, id).await? {
                Some(saved) => saved.plan,
                None => {
                    notify_plan_not_found(localizer);
                    return Ok(());
                }
            }
        }
        None => MealPlan::new(),
    };

    write_plan(output, &plan)?;
    let key = if from.is_some() { "plan-loaded" } else { "plan-new" };
    notify_success(localizer, localizer.t(key));
    Ok(())
}

async fn plans_command(config: &AppConfig, localizer: &Localizer, action: PlanCommand) -> Result<()> {
    let success = |key: &str| notify_success(localizer, localizer.t(key));
    let not_found = || notify_plan_not_found(localizer);

    match action {
        PlanCommand::New { output, from } => new_plan_command(config, localizer, &output, from).await?,
        PlanCommand::Assign {
            day,
            meal,
            dish,
            target,
        } => {
            let edit = SlotEdit::Assign(Slot::new(day, meal), DishName::new(&dish)?);
            edit_plan_command(config, localizer, edit, target).await?;
        }
        PlanCommand::Clear { day, meal, target } => {
            let edit = SlotEdit::Clear(Slot::new(day, meal));
            edit_plan_command(config, localizer, edit, target).await?;
        }
        PlanCommand::Save { user, plan } => {
            let plan = load_plan(&plan)?;
            let pool = connect(config).await?;
            let id = db::create_meal_plan(&pool, &user, &plan).await?;
            success("plan-saved");
            println!("{}", id);
        }
        PlanCommand::List { user, limit } => {
            let pool = connect(config).await?;
            for saved in db::list_recent_meal_plans(&pool, &user, limit).await? {
                println!(
                    "{}\t{}\t{} slots",
                    saved.id,
                    saved.created_at.format("%Y-%m-%d %H:%M"),
                    saved.plan.filled_slots()
                );
            }
        }
        PlanCommand::Show { id } => {
            let pool = connect(config).await?;
            match db::read_meal_plan(&pool, id).await? {
                Some(saved) => {
                    success("plan-loaded");
                    println!("{}", saved.plan.to_json_pretty()?);
                }
                None => not_found(),
            }
        }
        PlanCommand::Update { id, user, plan } => {
            let plan = load_plan(&plan)?;
            let pool = connect(config).await?;
            match db::update_meal_plan(&pool, id, &user, &plan).await? {
                Some(_) => success("plan-saved"),
                None => not_found(),
            }
        }
        PlanCommand::Delete { id, user } => {
            let pool = connect(config).await?;
            if db::delete_meal_plan(&pool, id, &user).await? {
                success("plan-deleted");
            } else {
                not_found();
            }
        }
    }
    Ok(())
}
