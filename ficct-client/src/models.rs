//! Backend records
//!
//! These mirror what the API sends. Fields the client does not use are kept
//! in `extra` so nothing is lost when a record is shown or sent back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Instructor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Docente {
    pub id: u64,
    #[serde(default)]
    pub nombre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apellido: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telefono: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub especialidad: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activo: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Docente {
    pub fn full_name(&self) -> String {
        match &self.apellido {
            Some(apellido) if !apellido.is_empty() => format!("{} {}", self.nombre, apellido),
            _ => self.nombre.clone(),
        }
    }
}

/// Degree program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Carrera {
    pub id: u64,
    #[serde(default)]
    pub nombre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub codigo: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Materia {
    pub id: u64,
    #[serde(default)]
    pub nombre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sigla: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrera_id: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rol {
    pub id: u64,
    #[serde(default)]
    pub nombre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permiso {
    pub id: u64,
    #[serde(default)]
    pub nombre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Classroom
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aula {
    pub id: u64,
    #[serde(default)]
    pub nombre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacidad: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disponible: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Academic term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Periodo {
    pub id: u64,
    #[serde(default)]
    pub nombre: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_inicio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha_fin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activo: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Time slot of the weekly timetable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloqueHorario {
    pub id: u64,
    pub hora_inicio: String,
    pub hora_fin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nombre: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One scheduled class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Horario {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub dia: String,
    pub hora_inicio: String,
    pub hora_fin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub materia: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grupo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docente: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Instructor together with the classes assigned to them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocenteHorarios {
    pub docente: Docente,
    #[serde(default)]
    pub horarios: Vec<Horario>,
}

/// Attendance record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asistencia {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docente_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horario_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fecha: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estado: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Audit log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bitacora {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usuario: Option<String>,
    #[serde(default)]
    pub accion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descripcion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
