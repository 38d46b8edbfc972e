/// Port for shielded ("0zk") address validation, owned by the wallet layer.
pub trait RailgunAddressValidator: Send + Sync {
    fn is_valid(&self, address: &str) -> bool;
}
