use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{char, digit1, multispace0, satisfy},
    combinator::{all_consuming, map, map_res, opt, value},
    sequence::{pair, preceded, separated_pair, terminated},
    IResult, Parser,
};

use crate::error::PlanError;
use crate::gas::{GasMix, AIR_O2_PERMILLE};

/// Parse a gas label such as `air`, `oxygen`, `EAN32`, `32%` or `Tx21/35`.
///
/// Percentages may carry one decimal (`EAN32.5`). The resulting mix is
/// validated, so `80/40` is rejected.
pub fn parse_gas(input: &str) -> Result<GasMix, PlanError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(PlanError::GasParse {
            input: input.to_string(),
            message: "empty gas label".to_string(),
        });
    }

    match all_consuming(gas_label).parse(trimmed) {
        Ok((_, (o2, he))) => GasMix::new(o2, he),
        Err(e) => Err(PlanError::GasParse {
            input: input.to_string(),
            message: format!("{e}"),
        }),
    }
}

fn gas_label(input: &str) -> IResult<&str, (u32, u32)> {
    alt((air, oxygen, trimix, nitrox, bare_percent)).parse(input)
}

/// A percentage with an optional tenth, returned in permille.
fn percent(input: &str) -> IResult<&str, u32> {
    map(
        pair(
            map_res(digit1, |s: &str| s.parse::<u32>()),
            opt(preceded(char('.'), satisfy(|c| c.is_ascii_digit()))),
        ),
        |(whole, tenth)| {
            whole
                .saturating_mul(10)
                .saturating_add(tenth.and_then(|c| c.to_digit(10)).unwrap_or(0))
        },
    )
    .parse(input)
}

fn air(input: &str) -> IResult<&str, (u32, u32)> {
    value((AIR_O2_PERMILLE, 0), tag_no_case("air")).parse(input)
}

fn oxygen(input: &str) -> IResult<&str, (u32, u32)> {
    value((1000, 0), alt((tag_no_case("oxygen"), tag_no_case("o2")))).parse(input)
}

fn nitrox(input: &str) -> IResult<&str, (u32, u32)> {
    let prefix = alt((
        tag_no_case("nitrox"),
        tag_no_case("ean"),
        tag_no_case("nx"),
    ));
    map(
        preceded(terminated(prefix, multispace0), terminated(percent, opt(char('%')))),
        |o2| (o2, 0),
    )
    .parse(input)
}

fn trimix(input: &str) -> IResult<&str, (u32, u32)> {
    let prefix = alt((
        tag_no_case("trimix"),
        tag_no_case("heliox"),
        tag_no_case("tmx"),
        tag_no_case("tx"),
    ));
    preceded(
        opt(terminated(prefix, multispace0)),
        separated_pair(percent, char('/'), percent),
    )
    .parse(input)
}

fn bare_percent(input: &str) -> IResult<&str, (u32, u32)> {
    map(terminated(percent, opt(char('%'))), |o2| (o2, 0)).parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_named_gases() {
        assert_eq!(parse_gas("air").unwrap(), GasMix::AIR);
        assert_eq!(parse_gas("AIR").unwrap(), GasMix::AIR);
        assert_eq!(parse_gas("oxygen").unwrap(), GasMix::OXYGEN);
        assert_eq!(parse_gas("O2").unwrap(), GasMix::OXYGEN);
    }

    #[test]
    fn test_parse_nitrox() {
        let ean32 = GasMix::from_permille(320, 0);
        assert_eq!(parse_gas("EAN32").unwrap(), ean32);
        assert_eq!(parse_gas("ean 32").unwrap(), ean32);
        assert_eq!(parse_gas("Nx32").unwrap(), ean32);
        assert_eq!(parse_gas("nitrox 32%").unwrap(), ean32);
        assert_eq!(parse_gas("32%").unwrap(), ean32);
        assert_eq!(parse_gas("  50 ").unwrap(), GasMix::from_permille(500, 0));
        assert_eq!(
            parse_gas("EAN32.5").unwrap(),
            GasMix::from_permille(325, 0)
        );
    }

    #[test]
    fn test_parse_trimix() {
        let tx = GasMix::from_permille(210, 350);
        assert_eq!(parse_gas("21/35").unwrap(), tx);
        assert_eq!(parse_gas("Tx21/35").unwrap(), tx);
        assert_eq!(parse_gas("trimix 21/35").unwrap(), tx);
        assert_eq!(
            parse_gas("heliox 10/90").unwrap(),
            GasMix::from_permille(100, 900)
        );
    }

    #[test]
    fn test_parse_round_trips_names() {
        for mix in [
            GasMix::AIR,
            GasMix::OXYGEN,
            GasMix::from_permille(500, 0),
            GasMix::from_permille(180, 450),
        ] {
            assert_eq!(parse_gas(&mix.name()).unwrap(), mix);
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(parse_gas(""), Err(PlanError::GasParse { .. })));
        assert!(matches!(parse_gas("   "), Err(PlanError::GasParse { .. })));
        assert!(matches!(parse_gas("EANxx"), Err(PlanError::GasParse { .. })));
        assert!(matches!(parse_gas("21/35 extra"), Err(PlanError::GasParse { .. })));
        assert!(matches!(
            parse_gas("80/40"),
            Err(PlanError::InvalidGas { .. })
        ));
        assert!(matches!(parse_gas("0"), Err(PlanError::InvalidGas { .. })));
    }
}
