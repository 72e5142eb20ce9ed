//! Checksum-valid Russian registration numbers.

use crate::randomization::Randomizer;

const INN_10_WEIGHTS: [u32; 9] = [2, 4, 10, 3, 5, 9, 4, 6, 8];
const INN_12_FIRST_WEIGHTS: [u32; 10] = [7, 2, 4, 10, 3, 5, 9, 4, 6, 8];
const INN_12_SECOND_WEIGHTS: [u32; 11] = [3, 7, 2, 4, 10, 3, 5, 9, 4, 6, 8];

fn random_digits(randomizer: &mut Randomizer, count: usize) -> Vec<u32> {
    (0..count)
        .map(|_| randomizer.integer(0, 9) as u32)
        .collect()
}

/// Leading region code, never `00`.
fn region_digits(randomizer: &mut Randomizer) -> Vec<u32> {
    let region = randomizer.integer(1, 99) as u32;
    vec![region / 10, region % 10]
}

fn weighted_check_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(digit, weight)| digit * weight).sum();
    sum % 11 % 10
}

fn digits_to_string(digits: &[u32]) -> String {
    digits
        .iter()
        .filter_map(|digit| char::from_digit(*digit, 10))
        .collect()
}

/// Check digit of an OGRN body: the body modulo `divisor`, last digit only.
fn ogrn_check_digit(body: &[u32], divisor: u64) -> u32 {
    let value = body
        .iter()
        .fold(0u64, |value, digit| (value * 10 + u64::from(*digit)) % divisor);
    (value % 10) as u32
}

/// 12 digit taxpayer number of an individual.
pub fn inn_fl(randomizer: &mut Randomizer) -> String {
    let mut digits = region_digits(randomizer);
    digits.extend(random_digits(randomizer, 8));

    digits.push(weighted_check_digit(&digits, &INN_12_FIRST_WEIGHTS));
    digits.push(weighted_check_digit(&digits, &INN_12_SECOND_WEIGHTS));

    digits_to_string(&digits)
}

/// 10 digit taxpayer number of a legal entity.
pub fn inn_ul(randomizer: &mut Randomizer) -> String {
    let mut digits = region_digits(randomizer);
    digits.extend(random_digits(randomizer, 7));

    digits.push(weighted_check_digit(&digits, &INN_10_WEIGHTS));

    digits_to_string(&digits)
}

/// 15 digit registration number of a sole proprietor.
pub fn ogrn_ip(randomizer: &mut Randomizer) -> String {
    let mut digits = vec![3];
    digits.extend(random_digits(randomizer, 13));

    digits.push(ogrn_check_digit(&digits, 13));

    digits_to_string(&digits)
}

/// 13 digit registration number of a legal entity.
pub fn ogrn_fl(randomizer: &mut Randomizer) -> String {
    let mut digits = vec![1];
    digits.extend(random_digits(randomizer, 11));

    digits.push(ogrn_check_digit(&digits, 11));

    digits_to_string(&digits)
}

/// 9 digit tax registration reason code.
pub fn kpp(randomizer: &mut Randomizer) -> String {
    let mut digits = region_digits(randomizer);
    digits.extend(random_digits(randomizer, 2));
    digits.extend([0, 1]);
    digits.extend(random_digits(randomizer, 3));

    digits_to_string(&digits)
}

/// Insurance number formatted as `NNN-NNN-NNN CC`.
pub fn snils_formatted(randomizer: &mut Randomizer) -> String {
    let digits = random_digits(randomizer, 9);

    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(index, digit)| digit * (9 - index as u32))
        .sum();
    let checksum = match sum % 101 {
        100 => 0,
        value => value,
    };

    let body = digits_to_string(&digits);
    format!(
        "{}-{}-{} {:02}",
        &body[..3],
        &body[3..6],
        &body[6..9],
        checksum
    )
}
