//! Typed endpoints
//!
//! Thin wrappers over [`ApiGateway::request`] for the backend resources. Each
//! call keeps the envelope; only `data` changes type. Lists accept the three
//! shapes the backend uses: a bare array, an array with a `pagination` block,
//! or a paginator object.

use crate::envelope::ApiResponse;
use crate::gateway::{ApiGateway, RequestOptions};
use crate::models::{
    Aula, Bitacora, BloqueHorario, Carrera, Docente, DocenteHorarios, Horario, Materia, Periodo,
    Permiso, Rol,
};
use crate::pagination::{PageQuery, Paginated};
use crate::validation::{Validate, Validator};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Fold any list shape into one page
pub(crate) fn into_page<T: DeserializeOwned>(
    response: ApiResponse<Value>,
) -> ApiResponse<Paginated<T>> {
    if !matches!(response.data, Some(Value::Array(_))) {
        return response.into_typed();
    }

    let meta = response.pagination.clone();
    let items: ApiResponse<Vec<T>> = response.into_typed();
    items.map(|items| match &meta {
        Some(meta) => Paginated::from_meta(items, meta),
        None => Paginated::single_page(items),
    })
}

/// Fold any list shape into a plain list
pub(crate) fn into_list<T: DeserializeOwned>(response: ApiResponse<Value>) -> ApiResponse<Vec<T>> {
    into_page(response).map(|page| page.data)
}

/// Instructor create/update form
#[derive(Debug, Clone, Default, Serialize)]
pub struct DocenteForm {
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub especialidad: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Validate for DocenteForm {
    fn validate(&self) -> Validator {
        let mut validator = Validator::new();
        validator
            .required("nombre", &self.nombre)
            .max_len("nombre", &self.nombre, 100)
            .required("apellido", &self.apellido)
            .max_len("apellido", &self.apellido, 100)
            .required("email", &self.email)
            .email("email", &self.email);
        if let Some(telefono) = &self.telefono {
            validator.max_len("telefono", telefono, 20);
        }
        validator
    }
}

/// Filters for classroom availability
#[derive(Debug, Clone, Default)]
pub struct AulaDisponibilidadQuery {
    pub dia: Option<String>,
    pub bloque_id: Option<u64>,
    pub periodo_id: Option<u64>,
}

impl AulaDisponibilidadQuery {
    fn apply(&self, mut options: RequestOptions) -> RequestOptions {
        if let Some(dia) = &self.dia {
            options = options.query("dia", dia);
        }
        if let Some(bloque_id) = self.bloque_id {
            options = options.query("bloque_id", bloque_id);
        }
        if let Some(periodo_id) = self.periodo_id {
            options = options.query("periodo_id", periodo_id);
        }
        options
    }
}

/// Date range and subject filters for attendance reports
#[derive(Debug, Clone, Default)]
pub struct ReporteFilter {
    pub desde: Option<NaiveDate>,
    pub hasta: Option<NaiveDate>,
    pub docente_id: Option<u64>,
    pub materia_id: Option<u64>,
}

impl Validate for ReporteFilter {
    fn validate(&self) -> Validator {
        let mut validator = Validator::new();
        if let (Some(desde), Some(hasta)) = (self.desde, self.hasta) {
            validator.not_before("hasta", desde, hasta);
        }
        validator
    }
}

impl ReporteFilter {
    fn apply(&self, mut options: RequestOptions) -> RequestOptions {
        if let Some(desde) = self.desde {
            options = options.query("fecha_inicio", desde.format(DATE_FORMAT));
        }
        if let Some(hasta) = self.hasta {
            options = options.query("fecha_fin", hasta.format(DATE_FORMAT));
        }
        if let Some(docente_id) = self.docente_id {
            options = options.query("docente_id", docente_id);
        }
        if let Some(materia_id) = self.materia_id {
            options = options.query("materia_id", materia_id);
        }
        options
    }
}

/// Audit log filters
#[derive(Debug, Clone, Default)]
pub struct BitacoraQuery {
    pub page: PageQuery,
    pub usuario: Option<String>,
    pub accion: Option<String>,
    pub desde: Option<NaiveDate>,
    pub hasta: Option<NaiveDate>,
}

impl BitacoraQuery {
    fn apply(&self, mut options: RequestOptions) -> RequestOptions {
        options = options.page(&self.page);
        if let Some(usuario) = self.usuario.as_deref().filter(|u| !u.trim().is_empty()) {
            options = options.query("usuario", usuario.trim());
        }
        if let Some(accion) = self.accion.as_deref().filter(|a| !a.trim().is_empty()) {
            options = options.query("accion", accion.trim());
        }
        if let Some(desde) = self.desde {
            options = options.query("fecha_inicio", desde.format(DATE_FORMAT));
        }
        if let Some(hasta) = self.hasta {
            options = options.query("fecha_fin", hasta.format(DATE_FORMAT));
        }
        options
    }
}

fn form_body<T: Serialize>(form: &T) -> Result<Value, ApiResponse<Value>> {
    serde_json::to_value(form)
        .map_err(|e| ApiResponse::failure("serialization error", e.to_string()))
}

impl ApiGateway {
    // Docentes

    pub async fn list_docentes(&self, query: &PageQuery) -> ApiResponse<Paginated<Docente>> {
        into_page(self.request("/docentes", RequestOptions::get().page(query)).await)
    }

    pub async fn get_docente(&self, id: u64) -> ApiResponse<Docente> {
        self.request_as(&format!("/docentes/{}", id), RequestOptions::get())
            .await
    }

    pub async fn create_docente(&self, form: &DocenteForm) -> ApiResponse<Docente> {
        if let Err(invalid) = form.validate().finish() {
            return invalid;
        }
        let body = match form_body(form) {
            Ok(body) => body,
            Err(failed) => return failed.discard(),
        };
        self.request_as("/docentes", RequestOptions::post(body)).await
    }

    pub async fn update_docente(&self, id: u64, form: &DocenteForm) -> ApiResponse<Docente> {
        if let Err(invalid) = form.validate().finish() {
            return invalid;
        }
        let body = match form_body(form) {
            Ok(body) => body,
            Err(failed) => return failed.discard(),
        };
        self.request_as(&format!("/docentes/{}", id), RequestOptions::put(body))
            .await
    }

    pub async fn delete_docente(&self, id: u64) -> ApiResponse<Value> {
        self.request(&format!("/docentes/{}", id), RequestOptions::delete())
            .await
    }

    /// Flip the active flag of an instructor
    pub async fn toggle_docente_estado(&self, id: u64) -> ApiResponse<Value> {
        self.request(
            &format!("/docentes/{}/estado", id),
            RequestOptions::patch(Value::Object(Default::default())),
        )
        .await
    }

    // Catalogs

    pub async fn list_roles(&self) -> ApiResponse<Vec<Rol>> {
        into_list(self.get("/roles").await)
    }

    pub async fn list_permisos(&self) -> ApiResponse<Vec<Permiso>> {
        into_list(self.get("/permisos").await)
    }

    pub async fn list_carreras(&self) -> ApiResponse<Vec<Carrera>> {
        into_list(self.get("/carreras").await)
    }

    pub async fn list_materias(&self, query: &PageQuery) -> ApiResponse<Paginated<Materia>> {
        into_page(self.request("/materias", RequestOptions::get().page(query)).await)
    }

    pub async fn list_bloques_horarios(&self) -> ApiResponse<Vec<BloqueHorario>> {
        into_list(self.get("/bloques-horarios").await)
    }

    pub async fn list_periodos(&self) -> ApiResponse<Vec<Periodo>> {
        into_list(self.get("/periodos").await)
    }

    pub async fn aulas_disponibilidad(
        &self,
        query: &AulaDisponibilidadQuery,
    ) -> ApiResponse<Vec<Aula>> {
        into_list(
            self.request("/aulas-disponibilidad", query.apply(RequestOptions::get()))
                .await,
        )
    }

    // Schedules

    pub async fn horario_docente(&self, docente_id: u64) -> ApiResponse<Vec<Horario>> {
        into_list(
            self.get(&format!("/coordinador/horario-docente/{}", docente_id))
                .await,
        )
    }

    pub async fn docentes_horarios(&self) -> ApiResponse<Vec<DocenteHorarios>> {
        into_list(self.get("/coordinador/docentes-horarios").await)
    }

    /// Timetable of the signed-in instructor
    pub async fn mi_horario(&self) -> ApiResponse<Vec<Horario>> {
        into_list(self.get("/mi-horario").await)
    }

    // Reports and audit

    /// Attendance report of the given kind (`docente`, `materia`, `general`, ...)
    pub async fn reporte_asistencias(
        &self,
        kind: &str,
        filter: &ReporteFilter,
    ) -> ApiResponse<Value> {
        if let Err(invalid) = filter.validate().finish() {
            return invalid;
        }
        let endpoint = format!("/reportes/asistencias/{}", urlencoding::encode(kind.trim()));
        self.request(&endpoint, filter.apply(RequestOptions::get()))
            .await
    }

    pub async fn list_bitacoras(&self, query: &BitacoraQuery) -> ApiResponse<Paginated<Bitacora>> {
        into_page(
            self.request("/bitacoras", query.apply(RequestOptions::get()))
                .await,
        )
    }
}
