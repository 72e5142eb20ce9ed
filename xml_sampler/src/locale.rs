use crate::randomization::Randomizer;
use fake::Fake;
use fake::faker::address::raw::{
    BuildingNumber, CityName, CountryName, PostCode, StateName, StreetName,
};
use fake::faker::company::raw::CompanyName;
use fake::faker::internet::raw::SafeEmail;
use fake::faker::name::raw::{FirstName, LastName};
use fake::faker::phone_number::raw::PhoneNumber;
use fake::locales::{EN, FR_FR, JA_JP, PT_BR, ZH_CN};

/// Kind of personal or postal data a locale provider can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocaleData {
    FirstName,
    LastName,
    MiddleName,
    PhoneNumber,
    Email,
    Country,
    City,
    Street,
    HouseNumber,
    Postcode,
    AdministrativeUnit,
    CompanyName,
    BankName,
}

impl LocaleData {
    pub fn from_function_name(name: &str) -> Option<LocaleData> {
        let data = match name {
            "first_name" => LocaleData::FirstName,
            "last_name" => LocaleData::LastName,
            "middle_name" => LocaleData::MiddleName,
            "phone_number" => LocaleData::PhoneNumber,
            "email" => LocaleData::Email,
            "country" => LocaleData::Country,
            "city" => LocaleData::City,
            "street" => LocaleData::Street,
            "house_number" => LocaleData::HouseNumber,
            "postcode" => LocaleData::Postcode,
            "administrative_unit" => LocaleData::AdministrativeUnit,
            "company_name" => LocaleData::CompanyName,
            "bank_name" => LocaleData::BankName,
            _ => return None,
        };

        Some(data)
    }
}

/// Locales with a data provider. Tags are matched case-insensitively, with
/// either `_` or `-` as separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    EnUs,
    FrFr,
    PtBr,
    JaJp,
    ZhCn,
}

impl Locale {
    pub fn from_tag(tag: &str) -> Option<Locale> {
        let normalized = tag.trim().replace('-', "_").to_ascii_lowercase();
        let locale = match normalized.as_str() {
            "en" | "en_us" => Locale::EnUs,
            "fr_fr" => Locale::FrFr,
            "pt_br" => Locale::PtBr,
            "ja_jp" => Locale::JaJp,
            "zh_cn" => Locale::ZhCn,
            _ => return None,
        };

        Some(locale)
    }
}

macro_rules! fake_in_locale {
    ($faker:ident, $locale:expr, $rng:expr) => {
        match $locale {
            Locale::EnUs => $faker(EN).fake_with_rng::<String, _>($rng),
            Locale::FrFr => $faker(FR_FR).fake_with_rng::<String, _>($rng),
            Locale::PtBr => $faker(PT_BR).fake_with_rng::<String, _>($rng),
            Locale::JaJp => $faker(JA_JP).fake_with_rng::<String, _>($rng),
            Locale::ZhCn => $faker(ZH_CN).fake_with_rng::<String, _>($rng),
        }
    };
}

/// Generate one value of `data` for `locale`.
pub fn fake_data(randomizer: &mut Randomizer, data: LocaleData, locale: Locale) -> String {
    let rng = randomizer.rng();
    match data {
        LocaleData::FirstName | LocaleData::MiddleName => fake_in_locale!(FirstName, locale, rng),
        LocaleData::LastName => fake_in_locale!(LastName, locale, rng),
        LocaleData::PhoneNumber => fake_in_locale!(PhoneNumber, locale, rng),
        LocaleData::Email => fake_in_locale!(SafeEmail, locale, rng),
        LocaleData::Country => fake_in_locale!(CountryName, locale, rng),
        LocaleData::City => fake_in_locale!(CityName, locale, rng),
        LocaleData::Street => fake_in_locale!(StreetName, locale, rng),
        LocaleData::HouseNumber => fake_in_locale!(BuildingNumber, locale, rng),
        LocaleData::Postcode => fake_in_locale!(PostCode, locale, rng),
        LocaleData::AdministrativeUnit => fake_in_locale!(StateName, locale, rng),
        LocaleData::CompanyName | LocaleData::BankName => fake_in_locale!(CompanyName, locale, rng),
    }
}
