//! 針對各遠端服務的多步驟輔助函式
//!
//! 所有 helper 都透過 `ClientContext::on` 指定服務，不會改動呼叫者目前選定的服務。

pub mod account;
pub mod listing;
pub mod media;
pub mod notification;
pub mod profile;
pub mod promotions;
pub mod review;

/// 審核決定（評論、promo 貢獻共用）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModerationDecision {
    Approve,
    Reject { reason: String },
}

impl ModerationDecision {
    pub(crate) fn form_fields(&self) -> Vec<(&'static str, String)> {
        match self {
            ModerationDecision::Approve => vec![("status", "approved".to_string())],
            ModerationDecision::Reject { reason } => vec![
                ("status", "rejected".to_string()),
                ("reason", reason.clone()),
            ],
        }
    }
}
