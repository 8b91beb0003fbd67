use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use super::activities::{
    balance_categories, create_shortage_need, select_organizations, select_providers,
};
use super::models::{ShortageNotification, SupplyDemandReport};
use super::utils::{
    ShortageThresholds, MAX_NOTIFIED_ORGANIZATIONS, MAX_NOTIFIED_PROVIDERS, SHORTAGE_WINDOW_HOURS,
};
use crate::domains::community::{Category, Organization, Post, Profile};
use crate::kernel::AgentDeps;
use crate::pipeline::{Stage, StageError, StageInput, StageName, StagePayload};

#[derive(Debug, Clone)]
pub struct SupplyDemandConfig {
    pub thresholds: ShortageThresholds,
    pub need_window_hours: i64,
    pub max_providers: usize,
    pub max_organizations: usize,
}

impl Default for SupplyDemandConfig {
    fn default() -> Self {
        Self {
            thresholds: ShortageThresholds::default(),
            need_window_hours: SHORTAGE_WINDOW_HOURS,
            max_providers: MAX_NOTIFIED_PROVIDERS,
            max_organizations: MAX_NOTIFIED_ORGANIZATIONS,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SupplyDemandStage {
    pub config: SupplyDemandConfig,
}

impl SupplyDemandStage {
    pub fn new(config: SupplyDemandConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Stage for SupplyDemandStage {
    fn name(&self) -> StageName {
        StageName::SupplyDemand
    }

    fn description(&self) -> &'static str {
        "Detects categories where requests outnumber offers"
    }

    async fn process(
        &self,
        input: &StageInput,
        deps: &AgentDeps,
    ) -> Result<StagePayload, StageError> {
        let store = deps.store_for(StageName::SupplyDemand);
        let now = Utc::now();
        let org_sync = input.org_sync_result();

        let posts = Post::find_open(&store).await;
        let categories = Category::find_all(&store).await;
        let balances = balance_categories(&categories, &posts, &self.config.thresholds);

        info!(
            posts = posts.len(),
            categories = categories.len(),
            uncategorized = balances.uncategorized,
            "Balanced open posts per category"
        );

        let shortages: Vec<_> = balances
            .categories
            .iter()
            .filter(|b| b.is_shortage)
            .cloned()
            .collect();

        let (profiles, organizations) = if shortages.is_empty() {
            (Vec::new(), Vec::new())
        } else {
            (
                Profile::find_all(&store).await,
                Organization::find_all(&store).await,
            )
        };

        let mut created_needs = Vec::new();
        let mut notifications = Vec::new();
        for shortage in &shortages {
            let need = create_shortage_need(
                shortage,
                &self.config.thresholds,
                self.config.need_window_hours,
                now,
                &store,
            )
            .await;

            let notification = ShortageNotification {
                category_id: shortage.category_id,
                category_slug: shortage.category_slug.clone(),
                top_need_id: need.as_ref().and_then(|n| n.id.clone()),
                providers: select_providers(
                    &profiles,
                    &shortage.category_slug,
                    self.config.max_providers,
                ),
                organizations: select_organizations(
                    org_sync.as_ref(),
                    &organizations,
                    &shortage.category_slug,
                    self.config.max_organizations,
                ),
            };
            debug!(
                category = %shortage.category_slug,
                providers = notification.providers.len(),
                organizations = notification.organizations.len(),
                "Prepared shortage notification"
            );
            notifications.push(notification);
            created_needs.extend(need);
        }

        info!(
            shortages = shortages.len(),
            created_needs = created_needs.len(),
            "Supply/demand balance completed"
        );

        Ok(StagePayload::SupplyDemand(SupplyDemandReport {
            categories_analyzed: balances.categories.len(),
            requests_examined: balances.requests,
            offers_examined: balances.offers,
            uncategorized_posts: balances.uncategorized,
            analysis: balances
                .categories
                .into_iter()
                .map(|b| (b.category_slug.clone(), b))
                .collect(),
            shortage_categories: shortages,
            created_needs,
            notifications,
            used_org_sync_data: org_sync.is_some(),
            storage_failures: store.failures(),
            timestamp: now,
        }))
    }
}
