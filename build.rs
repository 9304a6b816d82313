fn main() {
    // Build scripts run on the host, so check the TARGET env var and only
    // emit ESP-IDF settings when cross-compiling for an espidf target
    if let Ok(target) = std::env::var("TARGET") {
        if target.ends_with("-espidf") {
            embuild::espidf::sysenv::output();
        }
    }
}
