use flatdb::{Config, Driver, FlatDbError, Identifiable, Identity};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Contact {
    phone: String,
    email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Customer {
    id: String,
    name: String,
    address: String,
    contact: Contact,
}

impl Identifiable for Customer {
    fn identity() -> Identity {
        Identity::new("customer", "customers")
    }

    fn identifier(&self) -> String {
        self.id.clone()
    }
}

fn customer(id: &str, name: &str, email: &str) -> Customer {
    Customer {
        id: id.to_string(),
        name: name.to_string(),
        address: "address".to_string(),
        contact: Contact {
            phone: "45533355".to_string(),
            email: email.to_string(),
        },
    }
}

fn load_config() -> flatdb::Result<Config> {
    match std::env::var("FLATDB_CONFIG") {
        Ok(path) => Config::load(Path::new(&path)),
        Err(_) => {
            let data_dir = std::env::var("FLATDB_DATA_DIR").unwrap_or_else(|_| "data".to_string());
            Ok(Config::new(data_dir))
        }
    }
}

fn run() -> flatdb::Result<()> {
    let config = load_config()?;
    log::info!("Opening store at: {}", config.dir.display());
    let driver = Driver::with_config(config)?;

    driver.upsert(&customer("CUST1", "sarouje", "sarouje@example.com"))?;
    driver.upsert(&customer("CUST2", "sony", "sony@example.com"))?;

    let found: Customer = driver
        .open::<Customer>()
        .filter("id", "=", "CUST2")
        .first()
        .as_entity()?;
    println!("{}", serde_json::to_string_pretty(&found)?);

    let mut renamed = found.clone();
    renamed.name = "Sony Arouje".to_string();
    driver.update(&renamed)?;

    let matches: Vec<Customer> = driver
        .open::<Customer>()
        .filter("contact.email", "endswith", "@example.com")
        .get()
        .as_entity()?;
    log::info!("{} customer(s) with an example.com address", matches.len());

    driver.delete(&renamed)?;
    match driver.open::<Customer>().filter("id", "=", "CUST2").first().as_entity::<Customer>() {
        Err(FlatDbError::RecordNotFound) => println!("CUST2 deleted"),
        other => log::warn!("Unexpected lookup result after delete: {other:?}"),
    }

    for error in driver.errors() {
        log::debug!("Recorded during run: {error}");
    }
    println!("Categories: {:?}", driver.store().categories()?);
    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
