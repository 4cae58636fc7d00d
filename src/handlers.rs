pub mod auth;
pub mod documents;
pub mod installation;
pub mod leads;
pub mod payments;
pub mod users;

#[cfg(test)]
mod tests {
    use axum::handler::Handler;

    use super::*;
    use crate::config::AppState;

    fn assert_handler<H, T>(_: H)
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
    }

    // Falha de compilação aqui significa rota que o Router não aceita
    #[test]
    fn read_routes_are_valid_axum_handlers() {
        assert_handler(leads::status_history);
        assert_handler(leads::get_stage_details);
        assert_handler(documents::list_documents);
        assert_handler(payments::list_payments);
        assert_handler(installation::get_installation);
        assert_handler(leads::get_lead);
        assert_handler(leads::list_leads);
    }
}
