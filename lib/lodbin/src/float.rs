//! Serde forms for float fields that survive JSON.
//!
//! serde_json writes every non-finite float as `null`, so NaN and the
//! infinities are written as the strings `"nan"`, `"inf"` and `"-inf"`
//! instead. A bare `null` still reads back as NaN.

use serde::de::{DeserializeOwned, Error};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

const NAN: &str = "nan";
const INF: &str = "inf";
const NEG_INF: &str = "-inf";

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
pub(crate) enum Repr<T> {
  Number(T),
  Text(String),
}

pub(crate) trait FloatText: Copy + Serialize + DeserializeOwned {
  fn to_repr(self) -> Repr<Self>;
  fn from_repr<E: Error>(repr: Option<Repr<Self>>) -> Result<Self, E>;
}

macro_rules! float_text {
  ($ty:ty) => {
    impl FloatText for $ty {
      fn to_repr(self) -> Repr<Self> {
        if self.is_nan() {
          Repr::Text(NAN.to_string())
        } else if self == <$ty>::INFINITY {
          Repr::Text(INF.to_string())
        } else if self == <$ty>::NEG_INFINITY {
          Repr::Text(NEG_INF.to_string())
        } else {
          Repr::Number(self)
        }
      }

      fn from_repr<E: Error>(repr: Option<Repr<Self>>) -> Result<Self, E> {
        match repr {
          None => Ok(<$ty>::NAN),
          Some(Repr::Number(value)) => Ok(value),
          Some(Repr::Text(text)) => match text.as_str() {
            NAN => Ok(<$ty>::NAN),
            INF => Ok(<$ty>::INFINITY),
            NEG_INF => Ok(<$ty>::NEG_INFINITY),
            other => Err(E::custom(format!("`{other}` is not a float"))),
          },
        }
      }
    }
  };
}

float_text!(f32);
float_text!(f64);

pub(crate) mod scalar {
  use super::*;

  pub(crate) fn serialize<T: FloatText, S: Serializer>(value: &T, ser: S) -> Result<S::Ok, S::Error> {
    value.to_repr().serialize(ser)
  }

  pub(crate) fn deserialize<'de, T: FloatText, D: Deserializer<'de>>(des: D) -> Result<T, D::Error> {
    T::from_repr(Option::<Repr<T>>::deserialize(des)?)
  }
}

pub(crate) mod triple {
  use super::*;

  pub(crate) fn serialize<T: FloatText, S: Serializer>(
    value: &[T; 3],
    ser: S,
  ) -> Result<S::Ok, S::Error> {
    value.map(FloatText::to_repr).serialize(ser)
  }

  pub(crate) fn deserialize<'de, T: FloatText, D: Deserializer<'de>>(
    des: D,
  ) -> Result<[T; 3], D::Error> {
    let [x, y, z] = <[Option<Repr<T>>; 3]>::deserialize(des)?;
    Ok([T::from_repr(x)?, T::from_repr(y)?, T::from_repr(z)?])
  }
}
