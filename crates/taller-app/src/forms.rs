// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use time::Date;

use crate::validation::{
    format_input_date, normalize_plate, parse_odometer, parse_optional_date, parse_optional_text,
    parse_optional_year, parse_photo_urls, parse_required_date,
};
use crate::{
    Cliente, ClienteId, FormKind, NewOrden, NivelCombustible, OrdenTrabajo, TipoDocumento,
    Vehiculo, VehiculoId,
};

/// Create-order fields as typed, before parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderFormInput {
    pub vehiculo_id: Option<VehiculoId>,
    pub odometro: String,
    pub nivel_combustible: NivelCombustible,
    pub fecha_ingreso: String,
    pub fecha_estimada_entrega: String,
    pub observaciones: String,
    pub fotos: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClienteFormInput {
    pub nombre: String,
    pub tipo_doc: TipoDocumento,
    pub numero_doc: String,
    pub telefono: String,
    pub email: String,
    pub direccion: String,
    pub consentimiento_comunicaciones: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehiculoFormInput {
    pub cliente_id: Option<ClienteId>,
    pub marca: String,
    pub linea_modelo: String,
    pub placa: String,
    pub anio: String,
    pub color: String,
}

/// A validated record, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormPayload {
    Orden(OrdenTrabajo),
    Cliente(Cliente),
    Vehiculo(Vehiculo),
}

impl FormPayload {
    pub fn kind(&self) -> FormKind {
        match self {
            Self::Orden(_) => FormKind::Orden,
            Self::Cliente(_) => FormKind::Cliente,
            Self::Vehiculo(_) => FormKind::Vehiculo,
        }
    }
}

impl NewOrderFormInput {
    pub fn blank(today: Date) -> Self {
        Self {
            vehiculo_id: None,
            odometro: String::new(),
            nivel_combustible: NivelCombustible::Medio,
            fecha_ingreso: format_input_date(Some(today)),
            fecha_estimada_entrega: String::new(),
            observaciones: String::new(),
            fotos: String::new(),
        }
    }

    pub fn validate(&self, vehiculos: &[Vehiculo]) -> Result<NewOrden> {
        let Some(vehiculo_id) = self.vehiculo_id.as_ref().filter(|id| !id.is_empty()) else {
            bail!("vehicle is required -- choose a vehicle and retry");
        };
        if !vehiculos.iter().any(|vehiculo| &vehiculo.id == vehiculo_id) {
            bail!("vehicle {vehiculo_id} does not exist -- choose a listed vehicle and retry");
        }
        if self.odometro.trim().is_empty() {
            bail!("odometer is required -- enter the intake kilometers and retry");
        }
        let odometro_ingreso =
            parse_odometer(&self.odometro).context("odometer must be a whole number of km")?;
        let fecha_ingreso =
            parse_required_date(&self.fecha_ingreso).context("entry date is invalid")?;
        let fecha_estimada_entrega = parse_optional_date(&self.fecha_estimada_entrega)
            .context("estimated delivery date is invalid")?;
        if let Some(entrega) = fecha_estimada_entrega
            && entrega < fecha_ingreso
        {
            bail!("estimated delivery must be on/after the entry date");
        }
        let fotos_url = parse_photo_urls(&self.fotos).context("photo list is invalid")?;

        Ok(NewOrden {
            vehiculo_id: vehiculo_id.clone(),
            fecha_ingreso,
            odometro_ingreso,
            nivel_combustible: self.nivel_combustible,
            fecha_estimada_entrega,
            observaciones: parse_optional_text(&self.observaciones),
            fotos_url,
        })
    }
}

impl ClienteFormInput {
    pub fn blank() -> Self {
        Self {
            nombre: String::new(),
            tipo_doc: TipoDocumento::Cc,
            numero_doc: String::new(),
            telefono: String::new(),
            email: String::new(),
            direccion: String::new(),
            consentimiento_comunicaciones: false,
        }
    }

    pub fn validate(&self, id: ClienteId, today: Date) -> Result<Cliente> {
        if self.nombre.trim().is_empty() {
            bail!("client name is required -- enter a name and retry");
        }
        if self.numero_doc.trim().is_empty() {
            bail!("document number is required -- enter the document and retry");
        }
        if self.telefono.trim().is_empty() {
            bail!("phone is required -- enter a phone number and retry");
        }
        let email = parse_optional_text(&self.email);
        if let Some(email) = &email
            && !email.contains('@')
        {
            bail!("email {email:?} is missing '@' -- fix the address or clear it");
        }

        Ok(Cliente {
            id,
            nombre: self.nombre.trim().to_owned(),
            tipo_doc: self.tipo_doc,
            numero_doc: self.numero_doc.trim().to_owned(),
            telefono: self.telefono.trim().to_owned(),
            email,
            direccion: parse_optional_text(&self.direccion),
            fecha_registro: today,
            consentimiento_comunicaciones: self.consentimiento_comunicaciones,
        })
    }
}

impl VehiculoFormInput {
    pub fn blank() -> Self {
        Self {
            cliente_id: None,
            marca: String::new(),
            linea_modelo: String::new(),
            placa: String::new(),
            anio: String::new(),
            color: String::new(),
        }
    }

    pub fn validate(&self, id: VehiculoId, clientes: &[Cliente]) -> Result<Vehiculo> {
        let Some(cliente_id) = self.cliente_id.as_ref().filter(|id| !id.is_empty()) else {
            bail!("owner is required -- choose a client and retry");
        };
        if !clientes.iter().any(|cliente| &cliente.id == cliente_id) {
            bail!("client {cliente_id} does not exist -- choose a listed client and retry");
        }
        if self.marca.trim().is_empty() {
            bail!("brand is required -- enter a brand and retry");
        }
        if self.linea_modelo.trim().is_empty() {
            bail!("model line is required -- enter a model and retry");
        }
        let placa = normalize_plate(&self.placa);
        if placa.is_empty() {
            bail!("plate is required -- enter a plate and retry");
        }
        let anio = parse_optional_year(&self.anio).context("year must have four digits")?;

        Ok(Vehiculo {
            id,
            cliente_id: cliente_id.clone(),
            marca: self.marca.trim().to_owned(),
            linea_modelo: self.linea_modelo.trim().to_owned(),
            placa,
            anio,
            color: parse_optional_text(&self.color),
        })
    }
}
