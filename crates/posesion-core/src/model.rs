//! Estate case data model
//!
//! Typed schema for the form payload. Every scalar is an optional
//! string on the wire and defaults to empty here; lists default to
//! empty; the representative block is genuinely optional. Field names
//! match the wire format (the government form's Spanish vocabulary)
//! so drafts round-trip byte-for-byte.

use serde::{Deserialize, Deserializer, Serialize};

/// The complete probate record to transcribe onto the form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstateCase {
    // Header quadruple, repeated on pages 1, 3 and 4.
    pub oficina: String,
    pub numero: String,
    pub fecha: String,
    pub hora: String,

    pub solicitante: Applicant,
    pub causante: Decedent,
    pub partida: DeathRecord,
    pub domicilio_causante: LastAddress,
    pub regimen_patrimonial: String,
    pub subinscripciones: String,
    pub representante: Option<Representative>,

    pub herederos: Vec<Heir>,

    pub bienes_raices: Vec<RealEstate>,
    pub vehiculos: Vec<Vehicle>,
    pub menaje: Vec<HouseholdGood>,
    pub inmuebles_excluidos: Vec<ExcludedRealty>,
    pub otros_muebles: Vec<OtherMovable>,
    pub otros_bienes: Vec<Security>,
    pub armas: Vec<Firearm>,
    pub pasivos: Vec<Liability>,

    pub observaciones: String,
    pub declaracion_impuesto: TaxDeclaration,
    #[serde(deserialize_with = "lenient_flag")]
    pub presuncion_20: bool,
    pub inventario_hojas: String,
    pub beneficio_inventario: String,
}

/// Applicant (solicitante) block, page 1 right column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Applicant {
    pub rut: String,
    pub nombres: String,
    pub primer_apellido: String,
    pub segundo_apellido: String,
    pub calle: String,
    pub numero_calle: String,
    pub letra: String,
    pub resto_domicilio: String,
    pub comuna: String,
    pub region: String,
    pub medio_contacto: String,
    pub correo: String,
    pub telefono: String,
    pub nacionalidad: String,
}

/// Decedent (causante) block, page 1 left column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Decedent {
    pub rut: String,
    pub nombres: String,
    pub primer_apellido: String,
    pub segundo_apellido: String,
    pub fecha_nacimiento: String,
    pub fecha_defuncion: String,
    pub estado_civil: String,
    pub nacionalidad: String,
    pub actividad: String,
}

impl Decedent {
    /// Full name as printed in the tax declaration area.
    pub fn full_name(&self) -> String {
        let joined = format!(
            "{} {} {}",
            self.nombres, self.primer_apellido, self.segundo_apellido
        );
        joined.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// Death registration reference (partida de defunción).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeathRecord {
    pub circunscripcion: String,
    pub tipo_registro: String,
    pub ano: String,
    pub n_inscripcion: String,
    pub lugar_defuncion: String,
}

/// Decedent's last address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LastAddress {
    pub calle: String,
    pub numero: String,
    pub letra: String,
    pub resto: String,
    pub comuna: String,
    pub region: String,
}

/// Optional legal representative block, page 1.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Representative {
    pub rut: String,
    pub tipo: String,
    pub cesionario: String,
    pub nombres: String,
    pub primer_apellido: String,
    pub segundo_apellido: String,
    pub calle: String,
    pub numero_calle: String,
    pub letra: String,
    pub resto_domicilio: String,
    pub comuna: String,
    pub region: String,
    pub documento_fundante: String,
    pub autorizante: String,
    pub fecha_doc: String,
    pub correo: String,
    pub telefono: String,
}

/// One heir row (pages 1-2 table).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Heir {
    pub rut: String,
    pub nombres: String,
    pub primer_apellido: String,
    pub segundo_apellido: String,
    pub fecha_nacimiento: String,
    pub fecha_defuncion: String,
    pub calidad: String,
    pub run_representacion: String,
    pub domicilio: String,
    pub comuna: String,
    pub region: String,
    pub cedente: String,
}

/// Real estate item (bienes raíces, page 3 table A1).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealEstate {
    pub tipo: String,
    pub rol_sii: String,
    pub comuna: String,
    pub fecha_adquisicion: String,
    pub fojas: String,
    pub numero_cbr: String,
    pub ano_cbr: String,
    pub conservador: String,
    pub ps: String,
    pub valoracion: String,
    pub exencion: String,
}

/// Vehicle item (page 3 table B1).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vehicle {
    pub ppu: String,
    pub codigo_sii: String,
    pub tipo: String,
    pub marca: String,
    pub modelo: String,
    pub ano: String,
    pub n_identificacion: String,
    pub ps: String,
    pub valoracion: String,
}

/// Household good (menaje, page 3 table B2).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HouseholdGood {
    pub descripcion: String,
    pub ps: String,
    pub valoracion: String,
}

/// Realty excluded from the estate (page 3 table C1).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExcludedRealty {
    pub descripcion: String,
    pub referencia: String,
    pub ps: String,
    pub valoracion: String,
    pub exencion: String,
}

/// Other movable good (page 3 table C2).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OtherMovable {
    pub descripcion: String,
    pub ps: String,
    pub valoracion: String,
}

/// Shares, deposits and other instruments (otros bienes, page 3 table C3).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Security {
    pub descripcion: String,
    pub institucion: String,
    pub n_certificado: String,
    pub ps: String,
    pub valoracion: String,
    pub exencion: String,
}

/// Firearm item (armas, page 3 table C4).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Firearm {
    pub descripcion: String,
    pub ps: String,
    pub valoracion: String,
    pub hurto: String,
}

/// Liability row (pasivos, page 4).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Liability {
    pub descripcion: String,
    pub acreedor: String,
    pub n_documento: String,
    pub valoracion: String,
}

/// Tax declaration branch on page 4.
///
/// Exactly one branch is marked per render; unknown or missing wire
/// values fall back to the exempt branch instead of failing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxDeclaration {
    #[default]
    Exentas,
    AfectasAlgunas,
    AfectasTodas,
}

impl TaxDeclaration {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "afectas_algunas" => Self::AfectasAlgunas,
            "afectas_todas" => Self::AfectasTodas,
            _ => Self::Exentas,
        }
    }
}

impl<'de> Deserialize<'de> for TaxDeclaration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.as_deref().map(Self::parse).unwrap_or_default())
    }
}

/// Accept the presumption flag as a real boolean or as the form's
/// string codes (`"1"` = active).
fn lenient_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Text(s)) => matches!(s.trim(), "1" | "true" | "si" | "sí"),
        None => false,
    })
}
