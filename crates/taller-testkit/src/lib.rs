// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use std::path::PathBuf;
use taller_app::{
    Cliente, ClienteId, EstadoOt, NivelCombustible, OrdenId, OrdenTrabajo, TipoDocumento,
    Vehiculo, VehiculoId,
};
use time::macros::date;
use time::{Date, Duration};

const FIRST_NAMES: [&str; 16] = [
    "Andrés", "Camila", "Santiago", "Valentina", "Juan", "Daniela", "Felipe", "Laura", "Mateo",
    "Sofía", "Julián", "Carolina", "Sebastián", "Paula", "Nicolás", "Natalia",
];
const LAST_NAMES: [&str; 18] = [
    "Gómez", "Rodríguez", "Martínez", "López", "García", "Hernández", "Pérez", "Sánchez",
    "Ramírez", "Torres", "Díaz", "Vargas", "Moreno", "Rojas", "Castro", "Ortiz", "Jiménez",
    "Muñoz",
];
const STREETS: [&str; 8] = [
    "Calle 10",
    "Carrera 43A",
    "Calle 33",
    "Avenida 80",
    "Carrera 70",
    "Calle 50",
    "Transversal 39",
    "Diagonal 75",
];
const EMAIL_DOMAINS: [&str; 4] = ["gmail.com", "hotmail.com", "outlook.com", "yahoo.es"];

const MOTOS: [(&str, &[&str]); 8] = [
    ("Yamaha", &["FZ 2.0", "MT-03", "XTZ 150", "NMAX 155"]),
    ("Honda", &["CB 190R", "XR 150L", "CB 125F", "Navi"]),
    ("Suzuki", &["Gixxer 150", "GN 125", "V-Strom 250"]),
    ("Bajaj", &["Pulsar NS 200", "Boxer CT 100", "Dominar 400"]),
    ("AKT", &["NKD 125", "TTR 200", "Dynamic Pro"]),
    ("KTM", &["Duke 200", "Duke 390", "Adventure 390"]),
    ("TVS", &["Apache RTR 160", "Raider 125"]),
    ("Kawasaki", &["Z400", "Ninja 400", "Versys-X 300"]),
];
const COLORS: [&str; 7] = ["Negro", "Rojo", "Azul", "Blanco", "Gris", "Verde", "Naranja"];

const OBSERVATIONS: [&str; 10] = [
    "Ruido en la cadena al acelerar",
    "Cambio de aceite y filtro",
    "Frenos delanteros esponjosos",
    "No enciende en frío",
    "Revisión de los 10.000 km",
    "Fuga de aceite por el cárter",
    "Luz de neutro no funciona",
    "Vibración en el manubrio",
    "Cambio de kit de arrastre",
    "Sincronización de carburador",
];

/// Day the generated shop history is anchored to.
pub const REFERENCE_DATE: Date = date!(2026 - 01 - 15);

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }

    fn bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

/// Collections generated together, with every reference resolvable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoShop {
    pub clientes: Vec<Cliente>,
    pub vehiculos: Vec<Vehiculo>,
    pub ordenes: Vec<OrdenTrabajo>,
}

#[derive(Debug, Clone)]
pub struct ShopFaker {
    rng: DeterministicRng,
    seed: u64,
}

impl ShopFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            seed: normalized,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn cliente(&mut self, id: ClienteId) -> Cliente {
        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        let second_last = self.pick(&LAST_NAMES);
        let tipo_doc = match self.rng.int_n(10) {
            0 => TipoDocumento::Ce,
            1 => TipoDocumento::Pasaporte,
            _ => TipoDocumento::Cc,
        };
        let email = self.rng.bool().then(|| {
            format!(
                "{}.{}@{}",
                ascii_slug(first),
                ascii_slug(last),
                self.pick(&EMAIL_DOMAINS)
            )
        });
        let direccion = self.rng.bool().then(|| {
            format!(
                "{} # {}-{}",
                self.pick(&STREETS),
                self.int_range(1, 120),
                self.int_range(1, 99)
            )
        });

        Cliente {
            id,
            nombre: format!("{first} {last} {second_last}"),
            tipo_doc,
            numero_doc: self.digits(if tipo_doc == TipoDocumento::Cc { 10 } else { 8 }),
            telefono: format!(
                "3{}{} {} {}",
                self.int_range(0, 2),
                self.int_range(0, 9),
                self.digits(3),
                self.digits(4)
            ),
            email,
            direccion,
            fecha_registro: REFERENCE_DATE - Duration::days(self.int_range(30, 900) as i64),
            consentimiento_comunicaciones: self.rng.bool(),
        }
    }

    pub fn vehiculo(&mut self, id: VehiculoId, cliente_id: ClienteId) -> Vehiculo {
        let (marca, lineas) = MOTOS[self.rng.int_n(MOTOS.len())];
        Vehiculo {
            id,
            cliente_id,
            marca: marca.to_owned(),
            linea_modelo: self.pick(lineas).to_owned(),
            placa: self.plate(),
            anio: Some(self.int_range(2012, 2026) as i32),
            color: self
                .rng
                .bool()
                .then(|| self.pick(&COLORS).to_owned()),
        }
    }

    pub fn orden(&mut self, id: OrdenId, vehiculo_id: VehiculoId) -> OrdenTrabajo {
        let fecha_ingreso = REFERENCE_DATE - Duration::days(self.int_range(0, 60) as i64);
        let fecha_estimada_entrega = self
            .rng
            .bool()
            .then(|| fecha_ingreso + Duration::days(self.int_range(1, 10) as i64));
        let photo_count = self.rng.int_n(4);
        let fotos_url = (1..=photo_count)
            .map(|index| format!("https://fotos.taller.example/{id}/{index}.jpg"))
            .collect();

        OrdenTrabajo {
            nivel_combustible: NivelCombustible::ALL[self.rng.int_n(NivelCombustible::ALL.len())],
            estado: EstadoOt::ALL[self.rng.int_n(EstadoOt::ALL.len())],
            observaciones: (self.rng.int_n(4) > 0).then(|| self.pick(&OBSERVATIONS).to_owned()),
            odometro_ingreso: self.int_range(800, 85_000) as u32,
            id,
            vehiculo_id,
            fecha_ingreso,
            fecha_estimada_entrega,
            fotos_url,
        }
    }

    /// Clients with one or two motorcycles each, and `ordenes` orders spread
    /// over those vehicles.
    pub fn shop(&mut self, clientes: usize, ordenes: usize) -> DemoShop {
        let mut shop = DemoShop {
            clientes: Vec::with_capacity(clientes),
            vehiculos: Vec::new(),
            ordenes: Vec::with_capacity(ordenes),
        };

        for _ in 0..clientes {
            let cliente_id = ClienteId::next_after(shop.clientes.iter().map(|c| &c.id));
            shop.clientes.push(self.cliente(cliente_id.clone()));
            for _ in 0..=self.rng.int_n(2) {
                let vehiculo_id = VehiculoId::next_after(shop.vehiculos.iter().map(|v| &v.id));
                let vehiculo = self.vehiculo(vehiculo_id, cliente_id.clone());
                shop.vehiculos.push(vehiculo);
            }
        }

        if shop.vehiculos.is_empty() {
            return shop;
        }
        for _ in 0..ordenes {
            let orden_id = OrdenId::next_after(shop.ordenes.iter().map(|o| &o.id));
            let vehiculo_id = shop.vehiculos[self.rng.int_n(shop.vehiculos.len())]
                .id
                .clone();
            let orden = self.orden(orden_id, vehiculo_id);
            shop.ordenes.push(orden);
        }
        shop
    }

    fn pick<'a>(&mut self, items: &'a [&'a str]) -> &'a str {
        items[self.rng.int_n(items.len())]
    }

    fn int_range(&mut self, min: u64, max: u64) -> u64 {
        if max <= min {
            return min;
        }
        min + self.rng.next_u64() % (max - min + 1)
    }

    fn digits(&mut self, count: usize) -> String {
        (0..count)
            .map(|_| char::from(b'0' + self.rng.int_n(10) as u8))
            .collect()
    }

    /// Colombian motorcycle plate: three letters, two digits, one letter.
    fn plate(&mut self) -> String {
        let mut letter = || char::from(b'A' + self.rng.int_n(26) as u8);
        let head: String = (0..3).map(|_| letter()).collect();
        let tail = letter();
        format!("{head}{}{tail}", self.digits(2))
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("taller.db");
    Ok((dir, db_path))
}

fn ascii_slug(value: &str) -> String {
    value
        .chars()
        .map(|ch| match ch {
            'á' | 'Á' => 'a',
            'é' | 'É' => 'e',
            'í' | 'Í' => 'i',
            'ó' | 'Ó' => 'o',
            'ú' | 'Ú' => 'u',
            'ñ' | 'Ñ' => 'n',
            other => other.to_ascii_lowercase(),
        })
        .collect()
}
