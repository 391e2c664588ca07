mod nominatim;

pub use nominatim::NominatimGeocoder;

const fn geocoder_host() -> &'static str {
    if let Some(host) = option_env!("GEOCODER_HOST") {
        host
    } else {
        "nominatim.openstreetmap.org"
    }
}

const fn geocoder_secure() -> bool {
    if let Some(secure) = option_env!("GEOCODER_SECURE") {
        const_str::eq_ignore_ascii_case!(secure, "true") || const_str::equal!(secure, "1")
    } else {
        true
    }
}

const fn geocoder_http_proto() -> &'static str {
    if geocoder_secure() { "https" } else { "http" }
}

const GEOCODER_HOST: &str = geocoder_host();
const GEOCODER_HTTP_PROTO: &str = geocoder_http_proto();

const GEOCODER_URL: &str = const_str::concat!(GEOCODER_HTTP_PROTO, "://", GEOCODER_HOST);
