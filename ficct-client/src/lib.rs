//! FICCT Client - API gateway and typed endpoints
//!
//! Every call to the scheduling backend goes through [`ApiGateway`], which
//! attaches the session token and normalizes the answer into an
//! [`ApiResponse`]. Login and logout keep the session store in step with the
//! server.

pub mod auth;
pub mod config;
pub mod dashboard;
pub mod envelope;
pub mod gateway;
pub mod models;
pub mod pagination;
pub mod resources;
pub mod schedule;
pub mod validation;

pub use auth::{LoginCredentials, LoginData};
pub use config::ApiClientConfig;
pub use dashboard::DashboardStats;
pub use envelope::*;
pub use gateway::{ApiGateway, RequestOptions};
pub use models::*;
pub use pagination::{paginate, PageQuery, Paginated};
pub use resources::{AulaDisponibilidadQuery, BitacoraQuery, DocenteForm, ReporteFilter};
pub use schedule::{Day, ScheduleGrid, TimeBlock};
pub use validation::{Validate, Validator};

pub use tokio_util::sync::CancellationToken;
