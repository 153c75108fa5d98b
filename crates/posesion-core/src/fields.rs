//! Field value resolution
//!
//! The registry decides *where* a value lands on the form; this module
//! decides *what* the value is. One resolver maps every logical field
//! path to its formatted value (including the paper form's code
//! defaults), and one dispatcher per repeating section turns a line
//! item into its row cells and its one-line continuation entry.

use crate::format::{format_clp, join_rut, slash_date, split_date, split_rut};
use crate::model::{
    Applicant, Decedent, EstateCase, ExcludedRealty, Firearm, Heir, HouseholdGood, Liability,
    OtherMovable, RealEstate, Representative, Security, Vehicle,
};

/// One formatted table row: column name → cell value.
pub type RowCells = Vec<(&'static str, String)>;

/// The nine repeating sections of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Herederos,
    BienesRaices,
    Vehiculos,
    Menaje,
    InmueblesExcluidos,
    OtrosMuebles,
    OtrosBienes,
    Armas,
    Pasivos,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::Herederos,
        Category::BienesRaices,
        Category::Vehiculos,
        Category::Menaje,
        Category::InmueblesExcluidos,
        Category::OtrosMuebles,
        Category::OtrosBienes,
        Category::Armas,
        Category::Pasivos,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "herederos" => Self::Herederos,
            "bienes_raices" => Self::BienesRaices,
            "vehiculos" => Self::Vehiculos,
            "menaje" => Self::Menaje,
            "inmuebles_excluidos" => Self::InmueblesExcluidos,
            "otros_muebles" => Self::OtrosMuebles,
            "otros_bienes" => Self::OtrosBienes,
            "armas" => Self::Armas,
            "pasivos" => Self::Pasivos,
            _ => return None,
        })
    }

    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Herederos => "herederos",
            Self::BienesRaices => "bienes_raices",
            Self::Vehiculos => "vehiculos",
            Self::Menaje => "menaje",
            Self::InmueblesExcluidos => "inmuebles_excluidos",
            Self::OtrosMuebles => "otros_muebles",
            Self::OtrosBienes => "otros_bienes",
            Self::Armas => "armas",
            Self::Pasivos => "pasivos",
        }
    }

    /// Column names this category's rows may emit.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Herederos => &[
                "numero",
                "rut",
                "nombres",
                "primer_apellido",
                "segundo_apellido",
                "fecha_nacimiento",
                "fecha_defuncion",
                "calidad",
                "run_rep",
                "domicilio",
                "comuna",
                "region",
                "cedente",
            ],
            Self::BienesRaices => &[
                "numero",
                "tipo",
                "rol_sii",
                "comuna",
                "fecha_adq",
                "fojas",
                "numero_cbr",
                "ano_cbr",
                "conservador",
                "ps",
                "valoracion",
                "exencion",
            ],
            Self::Vehiculos => &[
                "numero",
                "ppu",
                "codigo_sii",
                "tipo",
                "marca",
                "modelo",
                "ano",
                "n_identificacion",
                "ps",
                "valoracion",
            ],
            Self::Menaje => &["numero", "descripcion", "ps", "valoracion"],
            Self::InmueblesExcluidos => {
                &["numero", "descripcion", "referencia", "ps", "valoracion", "exencion"]
            }
            Self::OtrosMuebles => &["numero", "descripcion", "ps", "valoracion"],
            Self::OtrosBienes => &[
                "numero",
                "descripcion",
                "institucion",
                "n_certificado",
                "ps",
                "valoracion",
                "exencion",
            ],
            Self::Armas => &["numero", "descripcion", "ps", "valoracion", "hurto"],
            Self::Pasivos => &["numero", "descripcion", "acreedor", "n_documento", "valoracion"],
        }
    }

    /// Whether the category's total contributes to the asset side of
    /// the estate (firearms are decided by registry data, see totals).
    pub fn is_asset(self) -> bool {
        !matches!(self, Self::Herederos | Self::Pasivos)
    }
}

/// Number of supplied items for a category.
pub fn section_len(case: &EstateCase, category: Category) -> usize {
    match category {
        Category::Herederos => case.herederos.len(),
        Category::BienesRaices => case.bienes_raices.len(),
        Category::Vehiculos => case.vehiculos.len(),
        Category::Menaje => case.menaje.len(),
        Category::InmueblesExcluidos => case.inmuebles_excluidos.len(),
        Category::OtrosMuebles => case.otros_muebles.len(),
        Category::OtrosBienes => case.otros_bienes.len(),
        Category::Armas => case.armas.len(),
        Category::Pasivos => case.pasivos.len(),
    }
}

/// Raw valuation strings for a category, in item order. Heirs carry no
/// valuation and yield an empty list.
pub fn valuations(case: &EstateCase, category: Category) -> Vec<&str> {
    match category {
        Category::Herederos => Vec::new(),
        Category::BienesRaices => case.bienes_raices.iter().map(|i| i.valoracion.as_str()).collect(),
        Category::Vehiculos => case.vehiculos.iter().map(|i| i.valoracion.as_str()).collect(),
        Category::Menaje => case.menaje.iter().map(|i| i.valoracion.as_str()).collect(),
        Category::InmueblesExcluidos => {
            case.inmuebles_excluidos.iter().map(|i| i.valoracion.as_str()).collect()
        }
        Category::OtrosMuebles => case.otros_muebles.iter().map(|i| i.valoracion.as_str()).collect(),
        Category::OtrosBienes => case.otros_bienes.iter().map(|i| i.valoracion.as_str()).collect(),
        Category::Armas => case.armas.iter().map(|i| i.valoracion.as_str()).collect(),
        Category::Pasivos => case.pasivos.iter().map(|i| i.valoracion.as_str()).collect(),
    }
}

/// Formatted cells for item `index` (0-based; printed row numbers are
/// continuous 1-based). `None` when the index is out of range.
pub fn section_row(case: &EstateCase, category: Category, index: usize) -> Option<RowCells> {
    let n = index + 1;
    Some(match category {
        Category::Herederos => heir_row(case.herederos.get(index)?, n),
        Category::BienesRaices => real_estate_row(case.bienes_raices.get(index)?, n),
        Category::Vehiculos => vehicle_row(case.vehiculos.get(index)?, n),
        Category::Menaje => household_row(case.menaje.get(index)?, n),
        Category::InmueblesExcluidos => excluded_realty_row(case.inmuebles_excluidos.get(index)?, n),
        Category::OtrosMuebles => other_movable_row(case.otros_muebles.get(index)?, n),
        Category::OtrosBienes => security_row(case.otros_bienes.get(index)?, n),
        Category::Armas => firearm_row(case.armas.get(index)?, n),
        Category::Pasivos => liability_row(case.pasivos.get(index)?, n),
    })
}

/// One-line continuation entry for item `index`, keeping its original
/// row number.
pub fn annex_line(case: &EstateCase, category: Category, index: usize) -> Option<String> {
    let n = index + 1;
    Some(match category {
        Category::Herederos => {
            let h = case.herederos.get(index)?;
            annex_entry(
                n,
                &[&join_rut(&h.rut), &h.nombres, &h.primer_apellido, &h.segundo_apellido, &h.calidad],
                "",
            )
        }
        Category::BienesRaices => {
            let b = case.bienes_raices.get(index)?;
            annex_entry(n, &[&b.tipo, &b.rol_sii, &b.comuna, &b.conservador], &b.valoracion)
        }
        Category::Vehiculos => {
            let v = case.vehiculos.get(index)?;
            annex_entry(n, &[&v.ppu, &v.marca, &v.modelo, &v.ano], &v.valoracion)
        }
        Category::Menaje => {
            let m = case.menaje.get(index)?;
            annex_entry(n, &[&m.descripcion], &m.valoracion)
        }
        Category::InmueblesExcluidos => {
            let e = case.inmuebles_excluidos.get(index)?;
            annex_entry(n, &[&e.descripcion, &e.referencia], &e.valoracion)
        }
        Category::OtrosMuebles => {
            let o = case.otros_muebles.get(index)?;
            annex_entry(n, &[&o.descripcion], &o.valoracion)
        }
        Category::OtrosBienes => {
            let s = case.otros_bienes.get(index)?;
            annex_entry(n, &[&s.descripcion, &s.institucion, &s.n_certificado], &s.valoracion)
        }
        Category::Armas => {
            let a = case.armas.get(index)?;
            annex_entry(n, &[&a.descripcion], &a.valoracion)
        }
        Category::Pasivos => {
            let p = case.pasivos.get(index)?;
            annex_entry(n, &[&p.descripcion, &p.acreedor, &p.n_documento], &p.valoracion)
        }
    })
}

/// Resolve a fixed-field path to its formatted value. `None` marks an
/// unknown path (a registry defect); an empty string is a known field
/// with nothing to draw.
pub fn resolve_field(case: &EstateCase, path: &str) -> Option<String> {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };
    match (head, rest) {
        ("oficina", None) => Some(case.oficina.clone()),
        ("numero", None) => Some(case.numero.clone()),
        ("fecha", None) => Some(case.fecha.clone()),
        ("hora", None) => Some(case.hora.clone()),
        ("regimen_patrimonial", None) => Some(case.regimen_patrimonial.clone()),
        ("subinscripciones", None) => Some(case.subinscripciones.clone()),
        ("observaciones", None) => Some(case.observaciones.clone()),
        ("inventario_hojas", None) => Some(or_code(&case.inventario_hojas, "1")),
        ("beneficio_inventario", None) => Some(or_code(&case.beneficio_inventario, "1")),
        ("presuncion_20", None) => Some(if case.presuncion_20 { "1" } else { "2" }.to_string()),
        ("solicitante", Some(field)) => applicant_field(&case.solicitante, field),
        ("causante", Some(field)) => decedent_field(&case.causante, field),
        ("partida", Some(field)) => match field {
            "circunscripcion" => Some(case.partida.circunscripcion.clone()),
            "tipo_registro" => Some(case.partida.tipo_registro.clone()),
            "ano" => Some(case.partida.ano.clone()),
            "n_inscripcion" => Some(case.partida.n_inscripcion.clone()),
            "lugar_defuncion" => Some(case.partida.lugar_defuncion.clone()),
            _ => None,
        },
        ("domicilio_causante", Some(field)) => match field {
            "calle" => Some(case.domicilio_causante.calle.clone()),
            "numero" => Some(case.domicilio_causante.numero.clone()),
            "letra" => Some(case.domicilio_causante.letra.clone()),
            "resto" => Some(case.domicilio_causante.resto.clone()),
            "comuna" => Some(case.domicilio_causante.comuna.clone()),
            "region" => Some(case.domicilio_causante.region.clone()),
            _ => None,
        },
        ("representante", Some(field)) => representative_field(case.representante.as_ref(), field),
        _ => None,
    }
}

/// Whether the resolver knows a path, independent of any case data.
pub fn is_known_field(path: &str) -> bool {
    resolve_field(&EstateCase::default(), path).is_some()
}

fn applicant_field(sol: &Applicant, field: &str) -> Option<String> {
    let (rut_numero, rut_dv) = split_rut(&sol.rut);
    Some(match field {
        "rut_numero" => rut_numero,
        "rut_dv" => rut_dv,
        "nacionalidad" => or_code(&sol.nacionalidad, "1"),
        "nombres" => sol.nombres.clone(),
        "primer_apellido" => sol.primer_apellido.clone(),
        "segundo_apellido" => sol.segundo_apellido.clone(),
        "calle" => sol.calle.clone(),
        "numero_calle" => sol.numero_calle.clone(),
        "letra" => sol.letra.clone(),
        "resto_domicilio" => sol.resto_domicilio.clone(),
        "comuna" => sol.comuna.clone(),
        "region" => sol.region.clone(),
        "medio_contacto" => or_code(&sol.medio_contacto, "1"),
        "correo" => sol.correo.clone(),
        "telefono" => sol.telefono.clone(),
        _ => return None,
    })
}

fn decedent_field(cau: &Decedent, field: &str) -> Option<String> {
    let (rut_numero, rut_dv) = split_rut(&cau.rut);
    let (nac_dd, nac_mm, nac_aaaa) = split_date(&cau.fecha_nacimiento);
    let (def_dd, def_mm, def_aaaa) = split_date(&cau.fecha_defuncion);
    Some(match field {
        "rut_numero" => rut_numero,
        "rut_dv" => rut_dv,
        "fecha_nacimiento_dd" => nac_dd,
        "fecha_nacimiento_mm" => nac_mm,
        "fecha_nacimiento_aaaa" => nac_aaaa,
        "fecha_defuncion_dd" => def_dd,
        "fecha_defuncion_mm" => def_mm,
        "fecha_defuncion_aaaa" => def_aaaa,
        "nombres" => cau.nombres.clone(),
        "primer_apellido" => cau.primer_apellido.clone(),
        "segundo_apellido" => cau.segundo_apellido.clone(),
        "estado_civil" => cau.estado_civil.clone(),
        "nacionalidad" => or_code(&cau.nacionalidad, "1"),
        "actividad" => cau.actividad.clone(),
        "nombre_completo" => cau.full_name(),
        _ => return None,
    })
}

// Path knowledge is independent of presence: an absent representative
// leaves every one of these blank rather than unresolved.
const REPRESENTATIVE_FIELDS: [&str; 19] = [
    "rut_numero",
    "rut_dv",
    "tipo",
    "cesionario",
    "nombres",
    "primer_apellido",
    "segundo_apellido",
    "calle",
    "numero_calle",
    "letra",
    "resto_domicilio",
    "comuna",
    "region",
    "documento_fundante",
    "autorizante",
    "fecha_doc",
    "correo",
    "telefono",
    "rut",
];

fn representative_field(rep: Option<&Representative>, field: &str) -> Option<String> {
    let Some(rep) = rep else {
        return REPRESENTATIVE_FIELDS.contains(&field).then(String::new);
    };
    let (rut_numero, rut_dv) = split_rut(&rep.rut);
    Some(match field {
        "rut" => join_rut(&rep.rut),
        "rut_numero" => rut_numero,
        "rut_dv" => rut_dv,
        "tipo" => rep.tipo.clone(),
        "cesionario" => or_code(&rep.cesionario, "2"),
        "nombres" => rep.nombres.clone(),
        "primer_apellido" => rep.primer_apellido.clone(),
        "segundo_apellido" => rep.segundo_apellido.clone(),
        "calle" => rep.calle.clone(),
        "numero_calle" => rep.numero_calle.clone(),
        "letra" => rep.letra.clone(),
        "resto_domicilio" => rep.resto_domicilio.clone(),
        "comuna" => rep.comuna.clone(),
        "region" => rep.region.clone(),
        "documento_fundante" => rep.documento_fundante.clone(),
        "autorizante" => rep.autorizante.clone(),
        "fecha_doc" => rep.fecha_doc.clone(),
        "correo" => rep.correo.clone(),
        "telefono" => rep.telefono.clone(),
        _ => return None,
    })
}

fn heir_row(h: &Heir, n: usize) -> RowCells {
    vec![
        ("numero", n.to_string()),
        ("rut", join_rut(&h.rut)),
        ("nombres", h.nombres.clone()),
        ("primer_apellido", h.primer_apellido.clone()),
        ("segundo_apellido", h.segundo_apellido.clone()),
        ("fecha_nacimiento", slash_date(&h.fecha_nacimiento)),
        ("fecha_defuncion", slash_date(&h.fecha_defuncion)),
        ("calidad", h.calidad.clone()),
        ("run_rep", h.run_representacion.clone()),
        ("domicilio", h.domicilio.clone()),
        ("comuna", h.comuna.clone()),
        ("region", h.region.clone()),
        ("cedente", h.cedente.clone()),
    ]
}

fn real_estate_row(b: &RealEstate, n: usize) -> RowCells {
    vec![
        ("numero", n.to_string()),
        ("tipo", b.tipo.clone()),
        ("rol_sii", b.rol_sii.clone()),
        ("comuna", b.comuna.clone()),
        ("fecha_adq", b.fecha_adquisicion.clone()),
        ("fojas", b.fojas.clone()),
        ("numero_cbr", b.numero_cbr.clone()),
        ("ano_cbr", b.ano_cbr.clone()),
        ("conservador", b.conservador.clone()),
        ("ps", or_code(&b.ps, "P")),
        ("valoracion", format_clp(&b.valoracion)),
        ("exencion", format_clp(&b.exencion)),
    ]
}

fn vehicle_row(v: &Vehicle, n: usize) -> RowCells {
    vec![
        ("numero", n.to_string()),
        ("ppu", v.ppu.clone()),
        ("codigo_sii", v.codigo_sii.clone()),
        ("tipo", v.tipo.clone()),
        ("marca", v.marca.clone()),
        ("modelo", v.modelo.clone()),
        ("ano", v.ano.clone()),
        ("n_identificacion", v.n_identificacion.clone()),
        ("ps", or_code(&v.ps, "P")),
        ("valoracion", format_clp(&v.valoracion)),
    ]
}

fn household_row(m: &HouseholdGood, n: usize) -> RowCells {
    vec![
        ("numero", n.to_string()),
        ("descripcion", m.descripcion.clone()),
        ("ps", or_code(&m.ps, "P")),
        ("valoracion", format_clp(&m.valoracion)),
    ]
}

fn excluded_realty_row(e: &ExcludedRealty, n: usize) -> RowCells {
    vec![
        ("numero", n.to_string()),
        ("descripcion", e.descripcion.clone()),
        ("referencia", e.referencia.clone()),
        ("ps", or_code(&e.ps, "P")),
        ("valoracion", format_clp(&e.valoracion)),
        ("exencion", format_clp(&e.exencion)),
    ]
}

fn other_movable_row(o: &OtherMovable, n: usize) -> RowCells {
    vec![
        ("numero", n.to_string()),
        ("descripcion", o.descripcion.clone()),
        ("ps", or_code(&o.ps, "P")),
        ("valoracion", format_clp(&o.valoracion)),
    ]
}

fn security_row(s: &Security, n: usize) -> RowCells {
    vec![
        ("numero", n.to_string()),
        ("descripcion", s.descripcion.clone()),
        ("institucion", s.institucion.clone()),
        ("n_certificado", s.n_certificado.clone()),
        ("ps", or_code(&s.ps, "P")),
        ("valoracion", format_clp(&s.valoracion)),
        ("exencion", format_clp(&s.exencion)),
    ]
}

fn firearm_row(a: &Firearm, n: usize) -> RowCells {
    vec![
        ("numero", n.to_string()),
        ("descripcion", a.descripcion.clone()),
        ("ps", or_code(&a.ps, "P")),
        ("valoracion", format_clp(&a.valoracion)),
        ("hurto", a.hurto.clone()),
    ]
}

fn liability_row(p: &Liability, n: usize) -> RowCells {
    vec![
        ("numero", n.to_string()),
        ("descripcion", p.descripcion.clone()),
        ("acreedor", p.acreedor.clone()),
        ("n_documento", p.n_documento.clone()),
        ("valoracion", format_clp(&p.valoracion)),
    ]
}

fn annex_entry(n: usize, parts: &[&str], valoracion: &str) -> String {
    let body = parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let money = format_clp(valoracion);
    match (body.is_empty(), money.is_empty()) {
        (false, false) => format!("{n}. {body} - ${money}"),
        (false, true) => format!("{n}. {body}"),
        (true, false) => format!("{n}. ${money}"),
        (true, true) => format!("{n}."),
    }
}

/// Fall back to a form code when the supplied value is blank.
fn or_code(value: &str, code: &str) -> String {
    if value.trim().is_empty() {
        code.to_string()
    } else {
        value.to_string()
    }
}
