//! # Meal Plan Engine
//!
//! Walks a [`MealPlan`], resolves every assigned dish through an
//! [`IngredientResolver`], and turns the result into a shopping list or an
//! export document.
//!
//! ## Resolution
//!
//! - Each distinct dish is looked up once, however many slots it fills
//! - At most `RecoveryConfig::concurrency` lookups run at the same time
//! - Every lookup, retries included, is bounded by `RecoveryConfig::lookup_budget`
//! - A failed lookup costs that dish its contribution and nothing else
//!
//! Results are collected per dish and then folded in canonical slot order, so
//! the outcome does not depend on which lookup finished first.
//!
//! ## Notices
//!
//! User-visible feedback goes to the injected [`NotificationSink`], worded by
//! the [`Localizer`]. Nothing here reads global state, and no operation mutates
//! the plan it is given.
//!
//! Dropping a returned future abandons the whole operation: a shopping list is
//! only handed out once every lookup has settled.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{debug, info, warn};

use crate::aggregation::ShoppingList;
use crate::config::{RecoveryConfig, DEFAULT_PRODUCT_ID};
use crate::errors::{ExportError, ResolveError};
use crate::export::calendar::{self, CalendarOptions};
use crate::export::share::{self, ShareChannel};
use crate::export::{print, ExportDocument, ExportFormat};
use crate::ingredient_parser::parse_ingredient_list;
use crate::localization::Localizer;
use crate::meal_plan::{DishName, MealPlan, Slot};
use crate::notification::{Notice, NoticeLevel, NotificationSink};
use crate::resolver::IngredientResolver;

/// A populated slot together with its dish's ingredient lines
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSlot {
    pub slot: Slot,
    pub dish: DishName,
    /// `None` when the lookup for this dish failed
    pub ingredients: Option<Vec<String>>,
}

/// A dish whose lookup failed, with every slot it was assigned to
#[derive(Debug, Clone, PartialEq)]
pub struct DishFailure {
    pub dish: DishName,
    pub slots: Vec<Slot>,
    pub error: ResolveError,
}

/// Outcome of resolving a whole plan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedPlan {
    /// Populated slots in canonical order
    pub slots: Vec<ResolvedSlot>,
    /// Failed dishes in order of first appearance
    pub failures: Vec<DishFailure>,
}

impl ResolvedPlan {
    /// Slots whose dish resolved successfully
    pub fn resolved_slots(&self) -> impl Iterator<Item = &ResolvedSlot> + '_ {
        self.slots.iter().filter(|slot| slot.ingredients.is_some())
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Shopping list plus what was left out of it
#[derive(Debug, Clone, Default)]
pub struct ShoppingListReport {
    pub list: ShoppingList,
    pub failures: Vec<DishFailure>,
    /// Number of slots whose ingredients were counted
    pub contributing_slots: usize,
}

impl ShoppingListReport {
    /// Ingredient lines that could not be totalled
    pub fn untotalled(&self) -> usize {
        self.list.unquantified().len()
    }
}

/// Meal plan aggregation engine
pub struct MealPlanEngine<'a> {
    resolver: &'a dyn IngredientResolver,
    sink: &'a dyn NotificationSink,
    localizer: &'a Localizer,
    recovery: RecoveryConfig,
    product_id: String,
}

impl<'a> MealPlanEngine<'a> {
    pub fn new(
        resolver: &'a dyn IngredientResolver,
        sink: &'a dyn NotificationSink,
        localizer: &'a Localizer,
    ) -> Self {
        Self {
            resolver,
            sink,
            localizer,
            recovery: RecoveryConfig::default(),
            product_id: DEFAULT_PRODUCT_ID.to_string(),
        }
    }

    pub fn with_recovery(mut self, recovery: RecoveryConfig) -> Self {
        self.recovery = recovery;
        self
    }

    /// PRODID used for calendar exports
    pub fn with_product_id(mut self, product_id: &str) -> Self {
        self.product_id = product_id.to_string();
        self
    }

    fn notify(&self, level: NoticeLevel, description: String) {
        let title_key = match level {
            NoticeLevel::Error => "notice-error",
            NoticeLevel::Warning => "notice-warning",
            NoticeLevel::Info | NoticeLevel::Success => "notice-success",
        };
        self.sink
            .notify(Notice::new(level, self.localizer.t(title_key), description));
    }

    async fn lookup(&self, dish: &DishName) -> Result<Vec<String>, ResolveError> {
        // Resolvers time out single attempts themselves; this bounds the retries too
        let budget = self.recovery.lookup_budget();
        match tokio::time::timeout(budget, self.resolver.resolve_ingredients(dish)).await {
            Ok(result) => result,
            Err(_) => Err(ResolveError::Timeout(format!("{dish} after {budget:?}"))),
        }
    }

    /// Resolve every assigned dish in the plan
    pub async fn resolve(&self, plan: &MealPlan) -> ResolvedPlan {
        let mut seen = HashSet::new();
        let unique: Vec<&DishName> = plan
            .slots()
            .map(|(_, dish)| dish)
            .filter(|dish| seen.insert(*dish))
            .collect();

        info!(
            slots = plan.filled_slots(),
            dishes = unique.len(),
            concurrency = self.recovery.concurrency,
            "Resolving meal plan dishes"
        );

        let outcomes: HashMap<&DishName, Result<Vec<String>, ResolveError>> = stream::iter(unique)
            .map(|dish| async move { (dish, self.lookup(dish).await) })
            .buffer_unordered(self.recovery.concurrency.max(1))
            .collect()
            .await;

        let mut resolved = ResolvedPlan::default();
        let mut failure_index: HashMap<&DishName, usize> = HashMap::new();

        for (slot, dish) in plan.slots() {
            let ingredients = match outcomes.get(dish) {
                Some(Ok(lines)) => Some(lines.clone()),
                Some(Err(error)) => {
                    match failure_index.get(dish).copied() {
                        Some(position) => resolved.failures[position].slots.push(slot),
                        None => {
                            warn!(dish = %dish, error = %error, "Skipping dish, ingredients unavailable");
                            failure_index.insert(dish, resolved.failures.len());
                            resolved.failures.push(DishFailure {
                                dish: dish.clone(),
                                slots: vec![slot],
                                error: error.clone(),
                            });
                        }
                    }
                    None
                }
                None => None,
            };
            resolved.slots.push(ResolvedSlot {
                slot,
                dish: dish.clone(),
                ingredients,
            });
        }

        debug!(
            resolved = resolved.resolved_slots().count(),
            failed = resolved.failures.len(),
            "Meal plan resolution finished"
        );
        resolved
    }

    /// Build the consolidated shopping list for a plan
    ///
    /// Failed dishes are left out and reported; the rest of the week is still
    /// aggregated.
    pub async fn generate_shopping_list(&self, plan: &MealPlan) -> ShoppingListReport {
        let resolved = self.resolve(plan).await;

        let mut list = ShoppingList::new();
        let mut contributing_slots = 0;
        for slot in resolved.resolved_slots() {
            let lines = slot.ingredients.as_deref().unwrap_or_default();
            for line in parse_ingredient_list(lines) {
                list.add_line(&line);
            }
            contributing_slots += 1;
        }

        let report = ShoppingListReport {
            list,
            failures: resolved.failures,
            contributing_slots,
        };
        self.announce_shopping_list(plan, &report);
        report
    }

    fn announce_shopping_list(&self, plan: &MealPlan, report: &ShoppingListReport) {
        for failure in &report.failures {
            let dish = failure.dish.as_str();
            match failure.error {
                ResolveError::NotFound(_) => self.notify(
                    NoticeLevel::Warning,
                    self.localizer.t_args("dish-not-found", &[("dish", dish)]),
                ),
                _ => self.notify(
                    NoticeLevel::Error,
                    self.localizer.t_args("dish-lookup-failed", &[("dish", dish)]),
                ),
            }
        }

        let untotalled = report.untotalled();
        if untotalled > 0 {
            warn!(count = untotalled, "Ingredient lines without a readable quantity were not totalled");
            self.notify(
                NoticeLevel::Warning,
                self.localizer.t_count("shopping-list-untotalled", untotalled),
            );
        }

        if !plan.is_empty() && report.contributing_slots == 0 {
            self.notify(NoticeLevel::Error, self.localizer.t("shopping-list-failed"));
            return;
        }

        info!(
            entries = report.list.len(),
            slots = report.contributing_slots,
            failed_dishes = report.failures.len(),
            "Shopping list generated"
        );
        self.notify(
            NoticeLevel::Success,
            self.localizer.t_count("shopping-list-ready", report.list.len()),
        );
    }

    /// Render the plan in the requested format
    ///
    /// Calendar exports start on `anchor`; other formats ignore it.
    pub async fn export(
        &self,
        plan: &MealPlan,
        format: ExportFormat,
        anchor: DateTime<Utc>,
    ) -> Result<ExportDocument, ExportError> {
        match self.render(plan, format, anchor).await {
            Ok(document) => {
                info!(format = %format, bytes = document.content.len(), "Meal plan exported");
                let description = match format.share_channel() {
                    Some(channel) => self
                        .localizer
                        .t_args("export-shared", &[("channel", channel.as_str())]),
                    None => self
                        .localizer
                        .t_args("export-success", &[("format", format.as_str())]),
                };
                self.notify(NoticeLevel::Success, description);
                Ok(document)
            }
            Err(err) => {
                self.report_export_failure(format, &err);
                Err(err)
            }
        }
    }

    /// Render the plan and write the document to `path`
    pub async fn export_to_file(
        &self,
        plan: &MealPlan,
        format: ExportFormat,
        anchor: DateTime<Utc>,
        path: &Path,
    ) -> Result<ExportDocument, ExportError> {
        let document = self.export(plan, format, anchor).await?;
        if let Err(err) = document.write_to(path) {
            self.report_export_failure(format, &err);
            return Err(err);
        }
        info!(path = %path.display(), "Export written");
        Ok(document)
    }

    fn report_export_failure(&self, format: ExportFormat, err: &ExportError) {
        warn!(format = %format, error = %err, "Export failed");
        self.notify(NoticeLevel::Error, self.localizer.t("export-failed"));
    }

    async fn render(
        &self,
        plan: &MealPlan,
        format: ExportFormat,
        anchor: DateTime<Utc>,
    ) -> Result<ExportDocument, ExportError> {
        match format {
            ExportFormat::Calendar => {
                let resolved = self.resolve(plan).await;
                for failure in &resolved.failures {
                    self.notify(
                        NoticeLevel::Warning,
                        self.localizer.t_args(
                            "export-missing-ingredients",
                            &[("dish", failure.dish.as_str())],
                        ),
                    );
                }
                let options = CalendarOptions::new(anchor).with_product_id(&self.product_id);
                let events = calendar::build_events(&resolved.slots, &options);
                Ok(ExportDocument::new(
                    format,
                    calendar::render_calendar(&events, &options),
                ))
            }
            ExportFormat::Print => Ok(ExportDocument::new(
                format,
                print::render_print_html(plan, &self.localizer.t("print-title")),
            )),
            ExportFormat::Text => Ok(ExportDocument::new(
                format,
                print::render_print_text(plan, &self.localizer.t("print-title")),
            )),
            ExportFormat::WhatsApp | ExportFormat::Email => {
                let text = share::share_text(plan)?;
                let channel = format.share_channel().unwrap_or(ShareChannel::WhatsApp);
                let link = share::share_link(channel, &text, &self.localizer.t("share-subject"));
                Ok(ExportDocument::new(format, text).with_link(link))
            }
        }
    }
}
