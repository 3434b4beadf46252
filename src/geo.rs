//! Lookup tables backing the geographic type testers.
//!
//! Membership checks are case-insensitive linear scans; the tables are small
//! and each check runs against at most the classifier's sample window.

const COUNTRY_CODES_2: &[&str] = &[
    "AR", "AT", "AU", "BD", "BE", "BG", "BO", "BR", "CA", "CH", "CL", "CN", "CO", "CR", "CU",
    "CZ", "DE", "DK", "DO", "DZ", "EC", "EG", "ES", "ET", "FI", "FR", "GB", "GH", "GR", "GT",
    "HK", "HN", "HR", "HU", "ID", "IE", "IL", "IN", "IQ", "IR", "IS", "IT", "JM", "JO", "JP",
    "KE", "KR", "KW", "KZ", "LB", "LK", "LT", "LU", "LV", "MA", "MX", "MY", "NG", "NL", "NO",
    "NP", "NZ", "PA", "PE", "PH", "PK", "PL", "PT", "PY", "QA", "RO", "RS", "RU", "SA", "SE",
    "SG", "SI", "SK", "SV", "TH", "TN", "TR", "TW", "TZ", "UA", "UG", "US", "UY", "UZ", "VE",
    "VN", "ZA", "ZM", "ZW",
];

const COUNTRY_CODES_3: &[&str] = &[
    "ARG", "AUS", "AUT", "BEL", "BGD", "BGR", "BOL", "BRA", "CAN", "CHE", "CHL", "CHN", "COL",
    "CRI", "CUB", "CZE", "DEU", "DNK", "DOM", "DZA", "ECU", "EGY", "ESP", "ETH", "FIN", "FRA",
    "GBR", "GHA", "GRC", "GTM", "HKG", "HND", "HRV", "HUN", "IDN", "IND", "IRL", "IRN", "IRQ",
    "ISL", "ISR", "ITA", "JAM", "JOR", "JPN", "KAZ", "KEN", "KOR", "KWT", "LBN", "LKA", "LTU",
    "LUX", "LVA", "MAR", "MEX", "MYS", "NGA", "NLD", "NOR", "NPL", "NZL", "PAN", "PER", "PHL",
    "PAK", "POL", "PRT", "PRY", "QAT", "ROU", "RUS", "SAU", "SGP", "SRB", "SVK", "SVN", "SWE",
    "THA", "TUN", "TUR", "TWN", "TZA", "UKR", "UGA", "URY", "USA", "UZB", "VEN", "VNM", "ZAF",
    "ZMB", "ZWE",
];

const COUNTRY_NAMES: &[&str] = &[
    "argentina", "australia", "austria", "bangladesh", "belgium", "bolivia", "brazil",
    "bulgaria", "canada", "chile", "china", "colombia", "costa rica", "croatia", "cuba",
    "czech republic", "denmark", "dominican republic", "ecuador", "egypt", "ethiopia",
    "finland", "france", "germany", "ghana", "greece", "guatemala", "honduras", "hungary",
    "iceland", "india", "indonesia", "iran", "iraq", "ireland", "israel", "italy", "jamaica",
    "japan", "jordan", "kazakhstan", "kenya", "kuwait", "latvia", "lebanon", "lithuania",
    "luxembourg", "malaysia", "mexico", "morocco", "nepal", "netherlands", "new zealand",
    "nigeria", "norway", "pakistan", "panama", "paraguay", "peru", "philippines", "poland",
    "portugal", "qatar", "romania", "russia", "saudi arabia", "serbia", "singapore",
    "slovakia", "slovenia", "south africa", "south korea", "spain", "sri lanka", "sweden",
    "switzerland", "taiwan", "tanzania", "thailand", "tunisia", "turkey", "uganda", "ukraine",
    "united kingdom", "united states", "uruguay", "uzbekistan", "venezuela", "vietnam",
    "zambia", "zimbabwe",
];

const CONTINENT_NAMES: &[&str] = &[
    "africa",
    "antarctica",
    "asia",
    "europe",
    "north america",
    "oceania",
    "south america",
];

const CITY_NAMES: &[&str] = &[
    "amsterdam", "athens", "atlanta", "austin", "baghdad", "bangkok", "barcelona", "beijing",
    "berlin", "bogota", "boston", "brussels", "budapest", "buenos aires", "cairo", "calgary",
    "cape town", "caracas", "chicago", "copenhagen", "dallas", "delhi", "denver", "detroit",
    "dubai", "dublin", "geneva", "hamburg", "hanoi", "havana", "helsinki", "hong kong",
    "houston", "istanbul", "jakarta", "johannesburg", "karachi", "kyiv", "lagos", "lima",
    "lisbon", "london", "los angeles", "madrid", "manila", "melbourne", "mexico city",
    "miami", "milan", "montreal", "moscow", "mumbai", "munich", "nairobi", "new york",
    "osaka", "oslo", "paris", "philadelphia", "phoenix", "prague", "rome", "san francisco",
    "santiago", "sao paulo", "seattle", "seoul", "shanghai", "singapore", "stockholm",
    "sydney", "tokyo", "toronto", "vancouver", "vienna", "warsaw", "zurich",
];

fn contains_ignore_case(table: &[&str], token: &str) -> bool {
    table.iter().any(|entry| entry.eq_ignore_ascii_case(token))
}

pub fn is_country_code_2(token: &str) -> bool {
    token.len() == 2 && contains_ignore_case(COUNTRY_CODES_2, token)
}

pub fn is_country_code_3(token: &str) -> bool {
    token.len() == 3 && contains_ignore_case(COUNTRY_CODES_3, token)
}

pub fn is_country_name(token: &str) -> bool {
    contains_ignore_case(COUNTRY_NAMES, token)
}

pub fn is_continent_name(token: &str) -> bool {
    contains_ignore_case(CONTINENT_NAMES, token)
}

pub fn is_city_name(token: &str) -> bool {
    contains_ignore_case(CITY_NAMES, token)
}
