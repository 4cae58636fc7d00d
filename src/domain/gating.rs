// src/domain/gating.rs

// Liberação de etapas: compara o índice de cada etapa com o índice do status atual.

use serde::Serialize;
use utoipa::ToSchema;

use super::privileges::can_act_on_stage;
use super::stages::{stage_index, Stage, StageGroup};

pub const TOOLTIP_NO_PERMISSION: &str = "no_permission";
pub const TOOLTIP_HANDOVER_NOT_READY: &str = "handover_not_ready";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StageTab {
    pub stage: Stage,
    pub label_key: String,
    // Começa igual à chave; o handler troca pelo texto traduzido
    pub label: String,
    pub enabled: bool,
    // Chave de tradução; resolvida pelo handler com o idioma da requisição
    pub tooltip: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StageGroupTabs {
    pub group: StageGroup,
    pub tabs: Vec<StageTab>,
}

/// Etapas com índice <= índice do status atual.
///
/// Um status fora do funil dá `indexOf == -1`: nenhuma etapa passa no filtro
/// e o conjunto visível fica vazio.
pub fn visible_stages(status: &str) -> Vec<Stage> {
    let Some(max_index) = stage_index(status) else {
        tracing::warn!("⚠️ Status '{}' fora do funil: nenhuma etapa visível.", status);
        return Vec::new();
    };

    Stage::ALL
        .iter()
        .copied()
        .filter(|stage| stage.index() <= max_index)
        .collect()
}

pub fn is_stage_reached(stage: Stage, status: &str) -> bool {
    stage_index(status).is_some_and(|current| stage.index() <= current)
}

fn tab_for(stage: Stage, status: &str, user_type: Option<&str>) -> StageTab {
    let enabled = can_act_on_stage(stage, user_type, Some(status));
    StageTab {
        stage,
        label_key: stage.label_key(),
        label: stage.label_key(),
        enabled,
        tooltip: (!enabled).then(|| TOOLTIP_NO_PERMISSION.to_string()),
    }
}

/// Troca chaves de rótulo e de tooltip pelos textos no idioma pedido.
pub fn localize_tabs<F>(groups: &mut [StageGroupTabs], translate: F)
where
    F: Fn(&str) -> String,
{
    for tab in groups.iter_mut().flat_map(|g| g.tabs.iter_mut()) {
        tab.label = translate(&tab.label_key);
        if let Some(key) = tab.tooltip.take() {
            tab.tooltip = Some(translate(&format!("tooltip.{}", key)));
        }
    }
}

/// Monta as abas agrupadas da tela do lead.
pub fn build_tabs(
    status: &str,
    user_type: Option<&str>,
    usable_handover_ready: bool,
) -> Vec<StageGroupTabs> {
    let mut tabs: Vec<StageTab> = visible_stages(status)
        .into_iter()
        .map(|stage| tab_for(stage, status, user_type))
        .collect();

    // Durante a instalação a aba de entrega já aparece, travada até a obra estar pronta.
    if status == Stage::UnderInstallation.as_str() {
        let mut handover = tab_for(Stage::FinalHandover, status, user_type);
        if !usable_handover_ready {
            handover.enabled = false;
            handover.tooltip = Some(TOOLTIP_HANDOVER_NOT_READY.to_string());
        }
        tabs.push(handover);
    }

    StageGroup::ALL
        .iter()
        .filter_map(|group| {
            let group_tabs: Vec<StageTab> = tabs
                .iter()
                .filter(|tab| tab.stage.group() == *group)
                .cloned()
                .collect();
            (!group_tabs.is_empty()).then_some(StageGroupTabs {
                group: *group,
                tabs: group_tabs,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::privileges::roles::{ADMIN, FACTORY, SALES_EXECUTIVE, SITE_SUPERVISOR};

    fn find_tab<'a>(groups: &'a [StageGroupTabs], stage: Stage) -> Option<&'a StageTab> {
        groups.iter().flat_map(|g| g.tabs.iter()).find(|t| t.stage == stage)
    }

    #[test]
    fn visible_set_is_prefix_up_to_current_status() {
        for current in Stage::ALL {
            let visible = visible_stages(current.as_str());
            assert_eq!(visible, Stage::ALL[..=current.index()].to_vec());
        }
    }

    #[test]
    fn unknown_status_hides_every_stage() {
        assert!(visible_stages("lost").is_empty());
        assert!(visible_stages("").is_empty());
        assert!(build_tabs("Booking", Some(ADMIN), false).is_empty());
    }

    #[test]
    fn stage_reached_uses_index_comparison() {
        assert!(is_stage_reached(Stage::Booking, "booking-stage"));
        assert!(is_stage_reached(Stage::LeadDetails, "dispatch-stage"));
        assert!(!is_stage_reached(Stage::Dispatch, "booking-stage"));
        assert!(!is_stage_reached(Stage::LeadDetails, "unknown"));
    }

    #[test]
    fn groups_without_visible_tabs_are_omitted() {
        let groups = build_tabs("designing-stage", Some(ADMIN), false);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].group, StageGroup::Lead);
        assert_eq!(groups[0].tabs.len(), 3);
    }

    #[test]
    fn under_installation_locks_handover_until_ready() {
        let status = "under-installation-stage";

        let groups = build_tabs(status, Some(SITE_SUPERVISOR), false);
        let installation = find_tab(&groups, Stage::UnderInstallation).unwrap();
        assert!(installation.enabled);
        let handover = find_tab(&groups, Stage::FinalHandover).unwrap();
        assert!(!handover.enabled);
        assert_eq!(handover.tooltip.as_deref(), Some(TOOLTIP_HANDOVER_NOT_READY));

        let groups = build_tabs(status, Some(SITE_SUPERVISOR), true);
        let handover = find_tab(&groups, Stage::FinalHandover).unwrap();
        assert!(handover.enabled);
        assert_eq!(handover.tooltip, None);
    }

    #[test]
    fn handover_ready_does_not_override_missing_privilege() {
        let groups = build_tabs("under-installation-stage", Some(FACTORY), true);
        let handover = find_tab(&groups, Stage::FinalHandover).unwrap();
        assert!(!handover.enabled);
        assert_eq!(handover.tooltip.as_deref(), Some(TOOLTIP_NO_PERMISSION));
    }

    #[test]
    fn past_stages_are_disabled_for_operational_roles() {
        let groups = build_tabs("booking-stage", Some(SALES_EXECUTIVE), false);
        assert!(find_tab(&groups, Stage::Booking).unwrap().enabled);
        assert!(!find_tab(&groups, Stage::Designing).unwrap().enabled);
        assert!(find_tab(&groups, Stage::FinalMeasurement).is_none());
    }

    #[test]
    fn localize_replaces_labels_and_tooltips() {
        let mut groups = build_tabs("booking-stage", Some(FACTORY), false);
        localize_tabs(&mut groups, |key| format!("<{}>", key));

        let tab = find_tab(&groups, Stage::Booking).unwrap();
        assert_eq!(tab.label, "<stage.booking-stage>");
        assert_eq!(tab.tooltip.as_deref(), Some("<tooltip.no_permission>"));
        assert_eq!(tab.label_key, "stage.booking-stage");
    }
}
