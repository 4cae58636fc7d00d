// src/domain/privileges.rs

// Predicados de privilégio.
// Todos são funções puras e totais: papel ou status ausente/desconhecido => false.

use super::stages::Stage;

pub mod roles {
    pub const SUPER_ADMIN: &str = "super_admin";
    pub const ADMIN: &str = "admin";
    pub const SALES_EXECUTIVE: &str = "sales-executive";
    pub const SITE_SUPERVISOR: &str = "site-supervisor";
    pub const FACTORY: &str = "factory";

    pub const ALL: [&str; 5] = [SUPER_ADMIN, ADMIN, SALES_EXECUTIVE, SITE_SUPERVISOR, FACTORY];
}

use roles::*;

/// Assinatura comum dos predicados ligados a uma etapa.
pub type StagePrivilege = fn(Option<&str>, Option<&str>) -> bool;

const ADMINS: &[&str] = &[SUPER_ADMIN, ADMIN];

fn has_role(user_type: Option<&str>, allowed: &[&str]) -> bool {
    user_type.is_some_and(|u| allowed.contains(&u))
}

fn status_in(lead_status: Option<&str>, stages: &[Stage]) -> bool {
    lead_status.is_some_and(|s| stages.iter().any(|stage| stage.as_str() == s))
}

// Admins sempre; o papel operacional só enquanto o lead está numa das etapas da janela.
fn admin_or_role_within(
    user_type: Option<&str>,
    lead_status: Option<&str>,
    role: &str,
    window: &[Stage],
) -> bool {
    has_role(user_type, ADMINS) || (has_role(user_type, &[role]) && status_in(lead_status, window))
}

pub fn is_known_role(user_type: &str) -> bool {
    roles::ALL.contains(&user_type)
}

// =========================================================================
//  PRIVILÉGIOS SÓ DE PAPEL
// =========================================================================

pub fn can_manage_users(user_type: Option<&str>) -> bool {
    has_role(user_type, ADMINS)
}

pub fn can_create_lead(user_type: Option<&str>) -> bool {
    has_role(user_type, &[SUPER_ADMIN, ADMIN, SALES_EXECUTIVE])
}

pub fn can_reassign_lead(user_type: Option<&str>) -> bool {
    has_role(user_type, ADMINS)
}

pub fn can_view_payments(user_type: Option<&str>) -> bool {
    has_role(user_type, &[SUPER_ADMIN, ADMIN, SALES_EXECUTIVE])
}

pub fn can_assign_installers(user_type: Option<&str>) -> bool {
    has_role(user_type, ADMINS)
}

// =========================================================================
//  PRIVILÉGIOS DE ETAPA (PAPEL + STATUS)
// =========================================================================

pub fn can_edit_lead_details(user_type: Option<&str>, lead_status: Option<&str>) -> bool {
    admin_or_role_within(
        user_type,
        lead_status,
        SALES_EXECUTIVE,
        &[Stage::LeadDetails, Stage::SiteMeasurement, Stage::Designing],
    )
}

pub fn can_site_measurement(user_type: Option<&str>, lead_status: Option<&str>) -> bool {
    admin_or_role_within(user_type, lead_status, SALES_EXECUTIVE, &[Stage::SiteMeasurement])
}

pub fn can_designing(user_type: Option<&str>, lead_status: Option<&str>) -> bool {
    admin_or_role_within(user_type, lead_status, SALES_EXECUTIVE, &[Stage::Designing])
}

pub fn can_booking(user_type: Option<&str>, lead_status: Option<&str>) -> bool {
    admin_or_role_within(user_type, lead_status, SALES_EXECUTIVE, &[Stage::Booking])
}

pub fn can_final_measurement(user_type: Option<&str>, lead_status: Option<&str>) -> bool {
    admin_or_role_within(user_type, lead_status, SITE_SUPERVISOR, &[Stage::FinalMeasurement])
}

pub fn can_client_documentation(user_type: Option<&str>, lead_status: Option<&str>) -> bool {
    admin_or_role_within(user_type, lead_status, SALES_EXECUTIVE, &[Stage::ClientDocumentation])
}

pub fn can_client_approval(user_type: Option<&str>, lead_status: Option<&str>) -> bool {
    admin_or_role_within(user_type, lead_status, SALES_EXECUTIVE, &[Stage::ClientApproval])
}

pub fn can_tech_check(user_type: Option<&str>, lead_status: Option<&str>) -> bool {
    admin_or_role_within(user_type, lead_status, FACTORY, &[Stage::TechCheck])
}

pub fn can_order_login(user_type: Option<&str>, lead_status: Option<&str>) -> bool {
    admin_or_role_within(user_type, lead_status, FACTORY, &[Stage::OrderLogin])
}

pub fn can_production(user_type: Option<&str>, lead_status: Option<&str>) -> bool {
    admin_or_role_within(user_type, lead_status, FACTORY, &[Stage::Production])
}

pub fn can_ready_to_dispatch(user_type: Option<&str>, lead_status: Option<&str>) -> bool {
    admin_or_role_within(user_type, lead_status, FACTORY, &[Stage::ReadyToDispatch])
}

pub fn can_site_readiness(user_type: Option<&str>, lead_status: Option<&str>) -> bool {
    admin_or_role_within(user_type, lead_status, SITE_SUPERVISOR, &[Stage::SiteReadiness])
}

pub fn can_dispatch_planning(user_type: Option<&str>, lead_status: Option<&str>) -> bool {
    admin_or_role_within(user_type, lead_status, SALES_EXECUTIVE, &[Stage::DispatchPlanning])
}

pub fn can_dispatch(user_type: Option<&str>, lead_status: Option<&str>) -> bool {
    admin_or_role_within(user_type, lead_status, FACTORY, &[Stage::Dispatch])
}

/// O supervisor de obra só atua enquanto o lead está "em instalação".
pub fn can_under_installation(user_type: Option<&str>, lead_status: Option<&str>) -> bool {
    admin_or_role_within(user_type, lead_status, SITE_SUPERVISOR, &[Stage::UnderInstallation])
}

pub fn can_final_handover(user_type: Option<&str>, lead_status: Option<&str>) -> bool {
    admin_or_role_within(
        user_type,
        lead_status,
        SITE_SUPERVISOR,
        &[Stage::UnderInstallation, Stage::FinalHandover],
    )
}

pub fn stage_privilege(stage: Stage) -> StagePrivilege {
    match stage {
        Stage::LeadDetails => can_edit_lead_details,
        Stage::SiteMeasurement => can_site_measurement,
        Stage::Designing => can_designing,
        Stage::Booking => can_booking,
        Stage::FinalMeasurement => can_final_measurement,
        Stage::ClientDocumentation => can_client_documentation,
        Stage::ClientApproval => can_client_approval,
        Stage::TechCheck => can_tech_check,
        Stage::OrderLogin => can_order_login,
        Stage::Production => can_production,
        Stage::ReadyToDispatch => can_ready_to_dispatch,
        Stage::SiteReadiness => can_site_readiness,
        Stage::DispatchPlanning => can_dispatch_planning,
        Stage::Dispatch => can_dispatch,
        Stage::UnderInstallation => can_under_installation,
        Stage::FinalHandover => can_final_handover,
    }
}

/// Nome do predicado, usado na mensagem de permissão negada.
pub fn privilege_name(stage: Stage) -> &'static str {
    match stage {
        Stage::LeadDetails => "can_edit_lead_details",
        Stage::SiteMeasurement => "can_site_measurement",
        Stage::Designing => "can_designing",
        Stage::Booking => "can_booking",
        Stage::FinalMeasurement => "can_final_measurement",
        Stage::ClientDocumentation => "can_client_documentation",
        Stage::ClientApproval => "can_client_approval",
        Stage::TechCheck => "can_tech_check",
        Stage::OrderLogin => "can_order_login",
        Stage::Production => "can_production",
        Stage::ReadyToDispatch => "can_ready_to_dispatch",
        Stage::SiteReadiness => "can_site_readiness",
        Stage::DispatchPlanning => "can_dispatch_planning",
        Stage::Dispatch => "can_dispatch",
        Stage::UnderInstallation => "can_under_installation",
        Stage::FinalHandover => "can_final_handover",
    }
}

pub fn can_act_on_stage(stage: Stage, user_type: Option<&str>, lead_status: Option<&str>) -> bool {
    stage_privilege(stage)(user_type, lead_status)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_user_types() -> Vec<Option<&'static str>> {
        let mut v: Vec<Option<&str>> = roles::ALL.iter().copied().map(Some).collect();
        v.push(None);
        v.push(Some("installer"));
        v.push(Some("ADMIN"));
        v
    }

    fn all_statuses() -> Vec<Option<&'static str>> {
        let mut v: Vec<Option<&str>> = Stage::ALL.iter().map(|s| Some(s.as_str())).collect();
        v.push(None);
        v.push(Some("lost"));
        v
    }

    // (etapa, papel operacional, janela de status em que o papel pode agir)
    fn expected_table() -> Vec<(Stage, &'static str, Vec<Stage>)> {
        vec![
            (
                Stage::LeadDetails,
                SALES_EXECUTIVE,
                vec![Stage::LeadDetails, Stage::SiteMeasurement, Stage::Designing],
            ),
            (Stage::SiteMeasurement, SALES_EXECUTIVE, vec![Stage::SiteMeasurement]),
            (Stage::Designing, SALES_EXECUTIVE, vec![Stage::Designing]),
            (Stage::Booking, SALES_EXECUTIVE, vec![Stage::Booking]),
            (Stage::FinalMeasurement, SITE_SUPERVISOR, vec![Stage::FinalMeasurement]),
            (Stage::ClientDocumentation, SALES_EXECUTIVE, vec![Stage::ClientDocumentation]),
            (Stage::ClientApproval, SALES_EXECUTIVE, vec![Stage::ClientApproval]),
            (Stage::TechCheck, FACTORY, vec![Stage::TechCheck]),
            (Stage::OrderLogin, FACTORY, vec![Stage::OrderLogin]),
            (Stage::Production, FACTORY, vec![Stage::Production]),
            (Stage::ReadyToDispatch, FACTORY, vec![Stage::ReadyToDispatch]),
            (Stage::SiteReadiness, SITE_SUPERVISOR, vec![Stage::SiteReadiness]),
            (Stage::DispatchPlanning, SALES_EXECUTIVE, vec![Stage::DispatchPlanning]),
            (Stage::Dispatch, FACTORY, vec![Stage::Dispatch]),
            (Stage::UnderInstallation, SITE_SUPERVISOR, vec![Stage::UnderInstallation]),
            (
                Stage::FinalHandover,
                SITE_SUPERVISOR,
                vec![Stage::UnderInstallation, Stage::FinalHandover],
            ),
        ]
    }

    #[test]
    fn stage_predicates_match_truth_table() {
        for (stage, role, window) in expected_table() {
            for user_type in all_user_types() {
                for status in all_statuses() {
                    let admin = matches!(user_type, Some(SUPER_ADMIN) | Some(ADMIN));
                    let in_window = status
                        .and_then(|s| s.parse::<Stage>().ok())
                        .is_some_and(|s| window.contains(&s));
                    let expected = admin || (user_type == Some(role) && in_window);

                    assert_eq!(
                        can_act_on_stage(stage, user_type, status),
                        expected,
                        "stage={stage} user={user_type:?} status={status:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn role_only_predicates_match_allow_lists() {
        for user_type in all_user_types() {
            let admin = matches!(user_type, Some(SUPER_ADMIN) | Some(ADMIN));
            let sales = user_type == Some(SALES_EXECUTIVE);

            assert_eq!(can_manage_users(user_type), admin);
            assert_eq!(can_reassign_lead(user_type), admin);
            assert_eq!(can_assign_installers(user_type), admin);
            assert_eq!(can_create_lead(user_type), admin || sales);
            assert_eq!(can_view_payments(user_type), admin || sales);
        }
    }

    #[test]
    fn site_supervisor_only_during_installation() {
        let sup = Some(SITE_SUPERVISOR);
        assert!(can_under_installation(sup, Some("under-installation-stage")));
        assert!(!can_under_installation(sup, Some("dispatch-stage")));
        assert!(!can_under_installation(sup, Some("final-handover-stage")));
        assert!(!can_under_installation(sup, None));
    }

    #[test]
    fn undefined_inputs_are_denied() {
        for stage in Stage::ALL {
            assert!(!can_act_on_stage(stage, None, None));
            assert!(!can_act_on_stage(stage, None, Some(stage.as_str())));
        }
        assert!(!can_manage_users(None));
        assert!(!can_create_lead(Some("")));
    }

    #[test]
    fn admins_bypass_status() {
        assert!(can_dispatch(Some(ADMIN), Some("lead-details-stage")));
        assert!(can_tech_check(Some(SUPER_ADMIN), None));
    }

    #[test]
    fn privilege_names_are_unique() {
        let names: std::collections::HashSet<&str> =
            Stage::ALL.iter().map(|s| privilege_name(*s)).collect();
        assert_eq!(names.len(), Stage::ALL.len());
        assert_eq!(privilege_name(Stage::Dispatch), "can_dispatch");
    }
}
