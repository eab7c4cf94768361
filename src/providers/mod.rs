pub mod kubera;
pub mod lunch_money;
pub mod util;

pub use kubera::KuberaClient;
pub use lunch_money::LunchMoneyClient;
