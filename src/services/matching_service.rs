//! Emparejamiento vehículo ↔ dispositivo
//!
//! Los dos orígenes nombran los vehículos de forma inconsistente, así que
//! se prueba una cascada de estrategias en orden de confianza y gana la
//! primera que encuentra un dispositivo. Dentro de una estrategia gana el
//! primer dispositivo en el orden en que los devolvió el host.

use tracing::{debug, info, warn};

use crate::models::{normalize_plate, Device, MatchStrategy, MatchedVehicle, RucVehicle};

/// Orden estricto de las estrategias
pub const MATCH_STRATEGIES: [MatchStrategy; 6] = [
    MatchStrategy::FleetNumberInName,
    MatchStrategy::ExactPlate,
    MatchStrategy::NormalizedPlate,
    MatchStrategy::PlateInName,
    MatchStrategy::GroupName,
    MatchStrategy::SerialNumber,
];

/// Buscar el dispositivo de un vehículo; `None` si ninguna estrategia acierta
pub fn find_device<'a>(vehicle: &RucVehicle, devices: &'a [Device]) -> Option<(&'a Device, MatchStrategy)> {
    MATCH_STRATEGIES.iter().find_map(|&strategy| {
        devices
            .iter()
            .find(|device| strategy_matches(strategy, vehicle, device))
            .map(|device| (device, strategy))
    })
}

fn strategy_matches(strategy: MatchStrategy, vehicle: &RucVehicle, device: &Device) -> bool {
    let fleet_number = vehicle.fleet_number.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let reg_plate = vehicle.reg_plate.as_deref().map(str::trim).filter(|s| !s.is_empty());

    match strategy {
        MatchStrategy::FleetNumberInName => match (fleet_number, device.name()) {
            (Some(fleet), Some(name)) => name.contains(fleet),
            _ => false,
        },
        MatchStrategy::ExactPlate => match (reg_plate, device.license_plate()) {
            (Some(plate), Some(device_plate)) => device_plate.to_lowercase() == plate.to_lowercase(),
            _ => false,
        },
        MatchStrategy::NormalizedPlate => match (reg_plate, device.license_plate()) {
            (Some(plate), Some(device_plate)) => {
                let clean = normalize_plate(plate);
                !clean.is_empty() && normalize_plate(device_plate) == clean
            }
            _ => false,
        },
        MatchStrategy::PlateInName => match (reg_plate, device.name()) {
            (Some(plate), Some(name)) => name.to_lowercase().contains(&plate.to_lowercase()),
            _ => false,
        },
        MatchStrategy::GroupName => device.group_names().any(|group| {
            fleet_number.map_or(false, |fleet| group.contains(fleet))
                || reg_plate.map_or(false, |plate| group.to_lowercase().contains(&plate.to_lowercase()))
        }),
        MatchStrategy::SerialNumber => match (fleet_number, device.serial_number()) {
            (Some(fleet), Some(serial)) => serial.contains(fleet),
            _ => false,
        },
    }
}

/// Emparejar todo el manifiesto con la lista de dispositivos del host
pub fn match_vehicles(vehicles: &[RucVehicle], devices: &[Device]) -> Vec<MatchedVehicle> {
    info!(
        "🔗 Emparejando {} vehículos RUC con {} dispositivos del host",
        vehicles.len(),
        devices.len()
    );

    for (index, device) in devices.iter().enumerate() {
        debug!(
            "  {}. Nombre: {:?}, Matrícula: {:?}, Serie: {:?}, ID: {}",
            index + 1,
            device.name(),
            device.license_plate(),
            device.serial_number(),
            device.id
        );
    }

    let matched: Vec<MatchedVehicle> = vehicles
        .iter()
        .map(|vehicle| match find_device(vehicle, devices) {
            Some((device, strategy)) => {
                debug!(
                    "✓ Flota #{} ({}) emparejado con '{}' vía {:?}",
                    vehicle.fleet_number_or_placeholder(),
                    vehicle.reg_plate_or_placeholder(),
                    device.name().unwrap_or(&device.id),
                    strategy
                );
                MatchedVehicle::matched(vehicle.clone(), device.clone(), strategy)
            }
            None => {
                debug!(
                    "✗ Sin dispositivo para flota #{} ({})",
                    vehicle.fleet_number_or_placeholder(),
                    vehicle.reg_plate_or_placeholder()
                );
                MatchedVehicle::unmatched(vehicle.clone())
            }
        })
        .collect();

    let matched_count = matched.iter().filter(|v| v.has_geotab_data).count();
    info!("✅ {} de {} vehículos emparejados", matched_count, vehicles.len());

    if !vehicles.is_empty() && matched_count * 2 < vehicles.len() {
        warn!("⚠️ Tasa de emparejamiento baja. Ejemplos del manifiesto:");
        for vehicle in vehicles.iter().take(5) {
            warn!(
                "  Flota #{}: {} ({})",
                vehicle.fleet_number_or_placeholder(),
                vehicle.reg_plate_or_placeholder(),
                vehicle.description_or_placeholder()
            );
        }
    }

    matched
}
