// This is used to (de)serialize sequences of numbers like committee listings.
// See the comment in `serde_utils::string_or_native`.

use core::{
    fmt::{Display, Formatter, Result as FmtResult},
    marker::PhantomData,
    str::FromStr,
};

use itertools::Itertools as _;
use serde::{
    de::{SeqAccess, Visitor},
    Deserialize, Deserializer, Serialize, Serializer,
};

#[derive(Deserialize, Serialize)]
#[serde(bound(
    deserialize = "T: Deserialize<'de> + FromStr<Err: Display>",
    serialize = "T: Serialize + Display",
))]
struct Wrapper<T>(#[serde(with = "crate::string_or_native")] T);

pub fn deserialize<'de, I, T, D>(deserializer: D) -> Result<T, D::Error>
where
    I: Deserialize<'de> + FromStr<Err: Display>,
    T: FromIterator<I>,
    D: Deserializer<'de>,
{
    struct AnyVisitor<I, T>(PhantomData<(I, T)>);

    impl<'de, I, T> Visitor<'de> for AnyVisitor<I, T>
    where
        I: Deserialize<'de> + FromStr<Err: Display>,
        T: FromIterator<I>,
    {
        type Value = T;

        fn expecting(&self, formatter: &mut Formatter) -> FmtResult {
            formatter.write_str("a sequence of strings or integers")
        }

        fn visit_seq<S: SeqAccess<'de>>(self, mut seq: S) -> Result<Self::Value, S::Error> {
            itertools::process_results(
                core::iter::from_fn(|| seq.next_element().transpose()).map_ok(|Wrapper(item)| item),
                |items| items.collect(),
            )
        }
    }

    deserializer.deserialize_seq(AnyVisitor(PhantomData))
}

pub fn serialize<S: Serializer>(
    items: impl IntoIterator<Item = impl Serialize + Display>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(items.into_iter().map(Wrapper))
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Result as JsonResult};

    use super::*;

    #[derive(PartialEq, Eq, Debug, Deserialize, Serialize)]
    #[serde(transparent)]
    struct Numbers(#[serde(with = "super")] Vec<u64>);

    #[test]
    fn serializes_to_strings_in_json() -> JsonResult<()> {
        let numbers = Numbers(vec![3, 4, 5]);
        let json = json!(["3", "4", "5"]);

        assert_eq!(serde_json::from_value::<Numbers>(json.clone())?, numbers);
        assert_eq!(serde_json::to_value(numbers)?, json);

        Ok(())
    }

    #[test]
    fn deserialize_also_accepts_numbers_in_json() -> JsonResult<()> {
        let numbers = Numbers(vec![3, 4, 5]);
        let json = json!([3, 4, 5]);

        assert_eq!(serde_json::from_value::<Numbers>(json)?, numbers);

        Ok(())
    }
}
