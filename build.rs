fn main() {
    // Compile-time overrides picked up through `option_env!` in config.rs.
    for var in ["WIFI_SSID", "WIFI_PASS", "SHUTTER_1_MAC", "SHUTTER_2_MAC"] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
