// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use time::Date;

use crate::ids::*;

/// Work-order status, in the order the dashboard presents it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EstadoOt {
    Recepcion,
    Diagnostico,
    Cotizado,
    Aprobado,
    EnProceso,
    Pruebas,
    Listo,
    Entregado,
    Cerrado,
}

impl EstadoOt {
    pub const ALL: [Self; 9] = [
        Self::Recepcion,
        Self::Diagnostico,
        Self::Cotizado,
        Self::Aprobado,
        Self::EnProceso,
        Self::Pruebas,
        Self::Listo,
        Self::Entregado,
        Self::Cerrado,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Recepcion => "recepcion",
            Self::Diagnostico => "diagnostico",
            Self::Cotizado => "cotizado",
            Self::Aprobado => "aprobado",
            Self::EnProceso => "en_proceso",
            Self::Pruebas => "pruebas",
            Self::Listo => "listo",
            Self::Entregado => "entregado",
            Self::Cerrado => "cerrado",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "recepcion" => Some(Self::Recepcion),
            "diagnostico" => Some(Self::Diagnostico),
            "cotizado" => Some(Self::Cotizado),
            "aprobado" => Some(Self::Aprobado),
            "en_proceso" => Some(Self::EnProceso),
            "pruebas" => Some(Self::Pruebas),
            "listo" => Some(Self::Listo),
            "entregado" => Some(Self::Entregado),
            "cerrado" => Some(Self::Cerrado),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Recepcion => "Recepción",
            Self::Diagnostico => "Diagnóstico",
            Self::Cotizado => "Cotizado",
            Self::Aprobado => "Aprobado",
            Self::EnProceso => "EnProceso",
            Self::Pruebas => "Pruebas",
            Self::Listo => "Listo",
            Self::Entregado => "Entregado",
            Self::Cerrado => "Cerrado",
        }
    }

    /// Still in the shop: not yet handed back or closed.
    pub const fn is_active(self) -> bool {
        !matches!(self, Self::Entregado | Self::Cerrado)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TipoDocumento {
    Cc,
    Ce,
    Nit,
    Pasaporte,
    Ti,
}

impl TipoDocumento {
    pub const ALL: [Self; 5] = [Self::Cc, Self::Ce, Self::Nit, Self::Pasaporte, Self::Ti];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cc => "CC",
            Self::Ce => "CE",
            Self::Nit => "NIT",
            Self::Pasaporte => "Pasaporte",
            Self::Ti => "TI",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "CC" => Some(Self::Cc),
            "CE" => Some(Self::Ce),
            "NIT" => Some(Self::Nit),
            "Pasaporte" => Some(Self::Pasaporte),
            "TI" => Some(Self::Ti),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NivelCombustible {
    Vacio,
    Cuarto,
    Medio,
    TresCuartos,
    Lleno,
}

impl NivelCombustible {
    pub const ALL: [Self; 5] = [
        Self::Vacio,
        Self::Cuarto,
        Self::Medio,
        Self::TresCuartos,
        Self::Lleno,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Vacio => "vacio",
            Self::Cuarto => "1/4",
            Self::Medio => "1/2",
            Self::TresCuartos => "3/4",
            Self::Lleno => "lleno",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "vacio" => Some(Self::Vacio),
            "1/4" => Some(Self::Cuarto),
            "1/2" => Some(Self::Medio),
            "3/4" => Some(Self::TresCuartos),
            "lleno" => Some(Self::Lleno),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Vacio => "Vacío",
            Self::Cuarto => "1/4",
            Self::Medio => "1/2",
            Self::TresCuartos => "3/4",
            Self::Lleno => "Lleno",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TabKind {
    Dashboard,
    Ordenes,
    Clientes,
    Vehiculos,
}

impl TabKind {
    pub const ALL: [Self; 4] = [Self::Dashboard, Self::Ordenes, Self::Clientes, Self::Vehiculos];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Ordenes => "Órdenes de Trabajo",
            Self::Clientes => "Clientes",
            Self::Vehiculos => "Vehículos",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "dashboard" => Some(Self::Dashboard),
            "ordenes" => Some(Self::Ordenes),
            "clientes" => Some(Self::Clientes),
            "vehiculos" => Some(Self::Vehiculos),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormKind {
    Orden,
    Cliente,
    Vehiculo,
}

impl FormKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Orden => "nueva orden",
            Self::Cliente => "nuevo cliente",
            Self::Vehiculo => "nuevo vehículo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppMode {
    Nav,
    Search,
    Form(FormKind),
    StatusChange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cliente {
    pub id: ClienteId,
    pub nombre: String,
    pub tipo_doc: TipoDocumento,
    pub numero_doc: String,
    pub telefono: String,
    pub email: Option<String>,
    pub direccion: Option<String>,
    pub fecha_registro: Date,
    pub consentimiento_comunicaciones: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehiculo {
    pub id: VehiculoId,
    pub cliente_id: ClienteId,
    pub marca: String,
    pub linea_modelo: String,
    pub placa: String,
    pub anio: Option<i32>,
    pub color: Option<String>,
}

impl Vehiculo {
    pub fn display_line(&self) -> String {
        format!("{} {} - {}", self.marca, self.linea_modelo, self.placa)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrdenTrabajo {
    pub id: OrdenId,
    pub vehiculo_id: VehiculoId,
    pub fecha_ingreso: Date,
    pub odometro_ingreso: u32,
    pub nivel_combustible: NivelCombustible,
    pub fecha_estimada_entrega: Option<Date>,
    pub observaciones: Option<String>,
    pub fotos_url: Vec<String>,
    pub estado: EstadoOt,
}

/// Validated create-order fields, before an order number is allocated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrden {
    pub vehiculo_id: VehiculoId,
    pub fecha_ingreso: Date,
    pub odometro_ingreso: u32,
    pub nivel_combustible: NivelCombustible,
    pub fecha_estimada_entrega: Option<Date>,
    pub observaciones: Option<String>,
    pub fotos_url: Vec<String>,
}

impl NewOrden {
    pub fn into_orden(self, id: OrdenId) -> OrdenTrabajo {
        OrdenTrabajo {
            id,
            vehiculo_id: self.vehiculo_id,
            fecha_ingreso: self.fecha_ingreso,
            odometro_ingreso: self.odometro_ingreso,
            nivel_combustible: self.nivel_combustible,
            fecha_estimada_entrega: self.fecha_estimada_entrega,
            observaciones: self.observaciones,
            fotos_url: self.fotos_url,
            estado: EstadoOt::Recepcion,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DashboardCounts {
    pub ordenes_activas: usize,
    pub listas_para_entrega: usize,
    pub clientes: usize,
    pub vehiculos: usize,
}
