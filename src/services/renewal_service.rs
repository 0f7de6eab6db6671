//! Registro de renovaciones RUC
//!
//! Renovar suma kilómetros al límite pagado (nunca lo reemplaza) y genera
//! un registro inmutable para el historial de la matrícula. No hay compra
//! real detrás: es contabilidad local.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{RenewalHistory, RenewalOption, RenewalQuote, RenewalRecord, RucVehicle};

/// Costo estimado: km × tarifa, redondeado a centavos
pub fn renewal_cost(km: u32, rate_per_km: Decimal) -> Decimal {
    (Decimal::from(km) * rate_per_km).round_dp(2)
}

/// Vista previa de las tres opciones sin modificar nada
pub fn quote(vehicle: &RucVehicle, rate_per_km: Decimal) -> Vec<RenewalQuote> {
    let current = vehicle.ruc_paid_to.unwrap_or(0);
    RenewalOption::ALL
        .iter()
        .map(|option| RenewalQuote {
            km: option.km(),
            current_paid_to: current,
            new_total: current + u64::from(option.km()),
            cost: renewal_cost(option.km(), rate_per_km),
        })
        .collect()
}

/// Aplicar la renovación al vehículo y devolver el registro
pub fn apply_renewal(
    vehicle: &mut RucVehicle,
    option: RenewalOption,
    rate_per_km: Decimal,
    now: DateTime<Utc>,
) -> RenewalRecord {
    let km = option.km();
    let new_total = vehicle.ruc_paid_to.unwrap_or(0) + u64::from(km);
    vehicle.ruc_paid_to = Some(new_total);

    RenewalRecord {
        id: Uuid::new_v4(),
        date: now,
        vehicle_key: vehicle.fleet_number.clone().unwrap_or_else(|| vehicle.key()),
        reg_plate: vehicle.reg_plate.clone(),
        km_added: km,
        new_total,
        cost: renewal_cost(km, rate_per_km),
    }
}

/// Clave del historial: la matrícula, o la clave del vehículo si no tiene
pub fn history_key(vehicle: &RucVehicle) -> String {
    vehicle.reg_plate.clone().unwrap_or_else(|| vehicle.key())
}

pub fn record_in_history(history: &mut RenewalHistory, key: String, record: RenewalRecord) {
    history.entry(key).or_default().push(record);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn rate() -> Decimal {
        Decimal::from_str("0.076").unwrap()
    }

    fn truck() -> RucVehicle {
        RucVehicle {
            vehicle_description: Some("Isuzu FVZ".into()),
            fleet_number: Some("101".into()),
            reg_plate: Some("ABC123".into()),
            ruc_paid_to: Some(50_000),
        }
    }

    #[test]
    fn test_renewal_is_additive() {
        let mut vehicle = truck();
        let record = apply_renewal(&mut vehicle, RenewalOption::Km5000, rate(), Utc::now());

        assert_eq!(vehicle.ruc_paid_to, Some(55_000));
        assert_eq!(record.new_total, 55_000);
        assert_eq!(record.km_added, 5000);
        assert_eq!(record.vehicle_key, "101");
        assert_eq!(record.cost, Decimal::from_str("380.00").unwrap());
    }

    #[test]
    fn test_renewal_order_does_not_matter() {
        let mut a = truck();
        apply_renewal(&mut a, RenewalOption::Km1000, rate(), Utc::now());
        apply_renewal(&mut a, RenewalOption::Km5000, rate(), Utc::now());

        let mut b = truck();
        apply_renewal(&mut b, RenewalOption::Km5000, rate(), Utc::now());
        apply_renewal(&mut b, RenewalOption::Km1000, rate(), Utc::now());

        assert_eq!(a.ruc_paid_to, b.ruc_paid_to);
        assert_eq!(a.ruc_paid_to, Some(56_000));
    }

    #[test]
    fn test_missing_paid_to_starts_from_zero() {
        let mut vehicle = RucVehicle { reg_plate: Some("NEW1".into()), ..Default::default() };
        let record = apply_renewal(&mut vehicle, RenewalOption::Km1000, rate(), Utc::now());
        assert_eq!(record.new_total, 1000);
        assert_eq!(record.vehicle_key, "NEW1");
    }

    #[test]
    fn test_quote_does_not_mutate() {
        let vehicle = truck();
        let quotes = quote(&vehicle, rate());
        assert_eq!(vehicle.ruc_paid_to, Some(50_000));
        assert_eq!(quotes.iter().map(|q| q.new_total).collect::<Vec<_>>(), vec![51_000, 55_000, 60_000]);
        assert_eq!(quotes[2].cost, Decimal::from_str("760.00").unwrap());
    }

    #[test]
    fn test_history_appends_per_plate() {
        let mut history = RenewalHistory::new();
        let mut vehicle = truck();
        for option in [RenewalOption::Km1000, RenewalOption::Km10000] {
            let record = apply_renewal(&mut vehicle, option, rate(), Utc::now());
            record_in_history(&mut history, history_key(&vehicle), record);
        }
        assert_eq!(history["ABC123"].len(), 2);
        assert_eq!(history["ABC123"][1].new_total, 61_000);
    }
}
