use crate::core::client::{ApiResponse, ClientContext};
use crate::services::{account, media, profile, promotions, review};
use crate::utils::error::Result;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureKind {
    User,
    Review,
    Image,
    Collection,
    Address,
    Promo,
}

impl fmt::Display for FixtureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FixtureKind::User => "user",
            FixtureKind::Review => "review",
            FixtureKind::Image => "image",
            FixtureKind::Collection => "collection",
            FixtureKind::Address => "address",
            FixtureKind::Promo => "promo",
        };
        f.write_str(name)
    }
}

/// 一個待清理的遠端資源，連同擁有者的 token
#[derive(Debug, Clone)]
pub struct TrackedFixture {
    pub kind: FixtureKind,
    pub id: String,
    token: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TeardownReport {
    pub deleted: usize,
    pub already_gone: usize,
    pub failures: Vec<String>,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn merge(&mut self, other: TeardownReport) {
        self.deleted += other.deleted;
        self.already_gone += other.already_gone;
        self.failures.extend(other.failures);
    }

    fn record(&mut self, kind: FixtureKind, id: &str, outcome: Result<ApiResponse>) {
        match outcome {
            Ok(response) if response.status.is_success() => self.deleted += 1,
            // 已經被刪除（或從未建立成功）都算清理完成
            Ok(response) if matches!(response.status_code(), 404 | 410) => self.already_gone += 1,
            Ok(response) => self.failures.push(format!(
                "{} {}: HTTP {} {}",
                kind,
                id,
                response.status_code(),
                response.body_snippet()
            )),
            Err(e) => self.failures.push(format!("{} {}: {}", kind, id, e)),
        }
    }
}

/// 記錄情境中建立的資源，結束時以 LIFO 順序刪除
#[derive(Debug, Default)]
pub struct FixtureTracker {
    fixtures: Vec<TrackedFixture>,
}

impl FixtureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, kind: FixtureKind, id: &str, token: &str) {
        tracing::debug!("📌 Tracking {} {}", kind, id);
        self.fixtures.push(TrackedFixture {
            kind,
            id: id.to_string(),
            token: token.to_string(),
        });
    }

    pub fn len(&self) -> usize {
        self.fixtures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixtures.is_empty()
    }

    pub fn tracked(&self) -> &[TrackedFixture] {
        &self.fixtures
    }

    /// 刪除所有追蹤中的資源；失敗只記錄，不中斷其餘清理
    pub async fn teardown(&mut self, ctx: &ClientContext) -> TeardownReport {
        let mut report = TeardownReport::default();

        while let Some(fixture) = self.fixtures.pop() {
            let outcome = delete_fixture(ctx, &fixture).await;
            report.record(fixture.kind, &fixture.id, outcome);
        }

        if report.is_clean() {
            tracing::debug!(
                "🧹 Teardown complete (deleted: {}, already gone: {})",
                report.deleted,
                report.already_gone
            );
        } else {
            for failure in &report.failures {
                tracing::warn!("🧹 Teardown failure: {}", failure);
            }
        }

        report
    }
}

async fn delete_fixture(ctx: &ClientContext, fixture: &TrackedFixture) -> Result<ApiResponse> {
    let token = fixture.token.as_str();
    let id = fixture.id.as_str();
    match fixture.kind {
        FixtureKind::User => account::delete_account(ctx, token).await,
        FixtureKind::Review => review::delete_review(ctx, token, id).await,
        FixtureKind::Image => media::delete_image(ctx, token, id).await,
        FixtureKind::Collection => profile::delete_collection(ctx, token, id).await,
        FixtureKind::Address => account::delete_address(ctx, token, id).await,
        FixtureKind::Promo => promotions::delete_promo(ctx, token, id).await,
    }
}

/// 清除前一次執行殘留、以 prefix 開頭的 promo code
pub async fn sweep_promos(ctx: &ClientContext, moderator_token: &str, prefix: &str) -> Result<TeardownReport> {
    let mut report = TeardownReport::default();

    for promo in promotions::promos_with_prefix(ctx, moderator_token, prefix).await? {
        let outcome = promotions::delete_promo(ctx, moderator_token, &promo.code).await;
        report.record(FixtureKind::Promo, &promo.code, outcome);
    }

    if report.deleted > 0 {
        tracing::info!("🧹 Swept {} leftover promo(s) with prefix '{}'", report.deleted, prefix);
    }
    Ok(report)
}
