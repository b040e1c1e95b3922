//! Dashboard counters
//!
//! The statistic requests go out together and the result is ready only once
//! every one of them has finished. A failed request counts as zero and its
//! message is kept in `failures`.

use crate::envelope::ApiResponse;
use crate::gateway::ApiGateway;
use crate::pagination::{PageQuery, Paginated};
use ficct_core::performance::measure_async;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub docentes: u64,
    pub materias: u64,
    pub carreras: u64,
    pub periodos: u64,
    /// `(counter, message)` for every request that failed
    pub failures: Vec<(String, String)>,
}

impl DashboardStats {
    pub async fn load(gateway: &ApiGateway) -> Self {
        // Only the totals are needed
        let probe = PageQuery::new().per_page(1);

        let (docentes, materias, carreras, periodos) = measure_async("dashboard_stats", async {
            futures::join!(
                gateway.list_docentes(&probe),
                gateway.list_materias(&probe),
                gateway.list_carreras(),
                gateway.list_periodos(),
            )
        })
        .await;

        let mut stats = Self::default();
        stats.docentes = stats.count_page("docentes", docentes);
        stats.materias = stats.count_page("materias", materias);
        stats.carreras = stats.count_list("carreras", carreras);
        stats.periodos = stats.count_list("periodos", periodos);
        stats
    }

    fn count_page<T>(&mut self, counter: &str, response: ApiResponse<Paginated<T>>) -> u64 {
        self.count(counter, response, |page| page.total)
    }

    fn count_list<T>(&mut self, counter: &str, response: ApiResponse<Vec<T>>) -> u64 {
        self.count(counter, response, |items| items.len() as u64)
    }

    fn count<T>(
        &mut self,
        counter: &str,
        response: ApiResponse<T>,
        total: impl FnOnce(T) -> u64,
    ) -> u64 {
        if !response.is_success() {
            let message = response.message_or("request failed");
            warn!(counter = counter, message = %message, "Dashboard statistic unavailable");
            self.failures.push((counter.to_string(), message));
            return 0;
        }
        response.data.map(total).unwrap_or(0)
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}
