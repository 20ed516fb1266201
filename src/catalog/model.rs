//! Catalog entities and their wire shapes.

use serde::{de, Deserialize, Deserializer, Serialize};

use crate::catalog::id::ProductId;

/// A product as stored and returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub short_description: String,
    pub description: String,
    pub image_url1: String,
    pub image_url2: String,
    pub image_url3: String,
    pub price: f32,
    pub tags: Vec<String>,
}

/// Body accepted by `POST /products`.
///
/// Unknown fields (including a client-chosen `id`) are rejected; `name` and
/// `price` are required, everything else defaults to empty.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url1: String,
    #[serde(default)]
    pub image_url2: String,
    #[serde(default)]
    pub image_url3: String,
    #[serde(deserialize_with = "finite_price")]
    pub price: f32,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Prices must survive the narrowing to `f32`; anything that overflows to
/// infinity would be written back to clients as `null`.
fn finite_price<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = f64::deserialize(deserializer)?;
    let price = raw as f32;
    if price.is_finite() {
        Ok(price)
    } else {
        Err(de::Error::custom(format!("price {raw} does not fit in f32")))
    }
}

impl NewProduct {
    /// Attach a server-assigned id.
    pub fn into_product(self, id: ProductId) -> Product {
        Product {
            id,
            name: self.name,
            short_description: self.short_description,
            description: self.description,
            image_url1: self.image_url1,
            image_url2: self.image_url2,
            image_url3: self.image_url3,
            price: self.price,
            tags: self.tags,
        }
    }
}

/// Liveness report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Liveness {
    pub version: String,
    #[serde(rename = "servicename")]
    pub service_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_body() -> serde_json::Value {
        json!({
            "name": "Tennis Racket",
            "shortDescription": "Carbon frame",
            "description": "A light racket for baseline players",
            "imageUrl1": "/static/images/racket_1.jpg",
            "imageUrl2": "/static/images/racket_2.jpg",
            "imageUrl3": "",
            "price": 129.5,
            "tags": ["tennis", "sport", "tennis"]
        })
    }

    #[test]
    fn test_new_product_full_body() {
        let p: NewProduct = serde_json::from_value(full_body()).unwrap();
        assert_eq!(p.name, "Tennis Racket");
        assert_eq!(p.short_description, "Carbon frame");
        assert_eq!(p.image_url2, "/static/images/racket_2.jpg");
        assert_eq!(p.price, 129.5);
        assert_eq!(p.tags, vec!["tennis", "sport", "tennis"]);
    }

    #[test]
    fn test_new_product_optional_fields_default() {
        let p: NewProduct = serde_json::from_value(json!({"name": "Ball", "price": 3})).unwrap();
        assert_eq!(p.description, "");
        assert_eq!(p.image_url1, "");
        assert!(p.tags.is_empty());
    }

    #[test]
    fn test_new_product_rejects_bad_shapes() {
        let mut with_id = full_body();
        with_id["id"] = json!("5c61f497e5fdadefe84ff9b9");
        let mut misspelled = full_body();
        misspelled["imageURL1"] = json!("x");
        let mut wrong_type = full_body();
        wrong_type["price"] = json!("cheap");

        for body in [
            with_id,
            misspelled,
            wrong_type,
            json!({"price": 1.0}),
            json!({"name": "no price"}),
            json!(["not", "an", "object"]),
        ] {
            assert!(
                serde_json::from_value::<NewProduct>(body.clone()).is_err(),
                "accepted {body}"
            );
        }
    }

    #[test]
    fn test_new_product_rejects_overflowing_price() {
        for price in [json!(1e300), json!(-1e39)] {
            let body = json!({"name": "x", "price": price});
            assert!(serde_json::from_value::<NewProduct>(body).is_err(), "accepted {price}");
        }
        let p: NewProduct =
            serde_json::from_value(json!({"name": "x", "price": 3.0e38})).unwrap();
        assert!(p.price.is_finite());
    }

    #[test]
    fn test_product_wire_names() {
        let id: ProductId = "5c61f497e5fdadefe84ff9b9".parse().unwrap();
        let p = serde_json::from_value::<NewProduct>(full_body())
            .unwrap()
            .into_product(id);
        let v = serde_json::to_value(&p).unwrap();
        assert_eq!(v["id"], "5c61f497e5fdadefe84ff9b9");
        assert_eq!(v["shortDescription"], "Carbon frame");
        assert_eq!(v["imageUrl1"], "/static/images/racket_1.jpg");
        assert_eq!(v["tags"][2], "tennis");
    }

    #[test]
    fn test_liveness_wire_names() {
        let l = Liveness {
            version: "v1".into(),
            service_name: "catalog".into(),
        };
        assert_eq!(
            serde_json::to_value(&l).unwrap(),
            json!({"version": "v1", "servicename": "catalog"})
        );
    }
}
