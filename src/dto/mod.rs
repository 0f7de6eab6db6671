pub mod addin_dto;
pub mod fleet_dto;
pub mod renewal_dto;
