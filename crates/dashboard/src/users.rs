//! 대시보드 사용자 생성
//!
//! 사용자는 대시보드 리더 유닛의 `add-user` 액션으로 생성되며,
//! 액션 결과의 `password` 필드로 초기 비밀번호가 반환됩니다.

use std::collections::BTreeMap;

use tracing::info;
use uuid::Uuid;

use dashprobe_core::types::{ActionOutcome, ActionStatus};
use dashprobe_model::ModelClient;

use crate::context::SuiteContext;
use crate::error::DashboardError;

const SCENARIO: &str = "create_user";

/// 사용자 생성 액션 이름
pub const ADD_USER_ACTION: &str = "add-user";

/// `"{prefix}-{uuid v4}"` 형식의 사용자 이름을 생성합니다.
pub fn random_username(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4())
}

/// 리더 유닛에서 `add-user` 액션을 실행합니다.
///
/// 액션 실패(중복 사용자 등)는 에러가 아니라 `Failed` 상태로 반환됩니다.
pub async fn create_user<M: ModelClient>(
    model: &M,
    application: &str,
    username: &str,
    role: &str,
) -> Result<ActionOutcome, DashboardError> {
    let params = BTreeMap::from([
        ("username".to_owned(), username.to_owned()),
        ("role".to_owned(), role.to_owned()),
    ]);
    let outcome = model
        .run_action_on_leader(application, ADD_USER_ACTION, &params)
        .await?;
    info!(username, role, unit = %outcome.unit, status = %outcome.status, "add-user finished");
    Ok(outcome)
}

/// 생성된 사용자의 비밀번호를 꺼냅니다. 완료되지 않았거나 비어 있으면 `scenario` 실패입니다.
pub fn password_from(outcome: &ActionOutcome, scenario: &str) -> Result<String, DashboardError> {
    if !outcome.status.is_completed() {
        return Err(DashboardError::assertion(
            scenario,
            format!("add-user expected completed, got {outcome}"),
        ));
    }
    outcome
        .result_str("password")
        .filter(|p| !p.is_empty())
        .map(str::to_owned)
        .ok_or_else(|| {
            DashboardError::assertion(scenario, "add-user completed without a password")
        })
}

/// 새 사용자 생성은 비밀번호와 함께 완료되고, 같은 이름으로 다시 만들면 실패해야 합니다.
pub async fn check_create_user<M: ModelClient>(ctx: &SuiteContext<M>) -> Result<(), DashboardError> {
    let dashboard = &ctx.config().dashboard;
    let username = random_username(&dashboard.username_prefix);

    let first = create_user(ctx.model(), ctx.application(), &username, &dashboard.user_role).await?;
    password_from(&first, SCENARIO)?;

    let second =
        create_user(ctx.model(), ctx.application(), &username, &dashboard.user_role).await?;
    if second.status != ActionStatus::Failed {
        return Err(DashboardError::assertion(
            SCENARIO,
            format!("duplicate add-user for '{username}' expected failed, got {}", second.status),
        ));
    }
    Ok(())
}
