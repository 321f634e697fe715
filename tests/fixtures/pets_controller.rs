// Controller source consumed by the end-to-end tests; never compiled.

pub struct PetController;

#[controller("/pets")]
impl PetController {
    #[get]
    #[operation_id("listPets")]
    pub fn list_pets(&self, #[query] limit: Option<u32>) -> Json<Vec<Pet>> {
        todo!()
    }

    #[get("/:id")]
    #[operation_id("getPet")]
    pub fn get_pet(&self, #[param] id: u64) -> Json<Pet> {
        todo!()
    }

    #[post]
    #[operation_id("createPet")]
    #[summary("Register a new pet")]
    pub fn create_pet(&self, #[body] #[schema("Pet")] pet: Value) -> Json<Pet> {
        todo!()
    }

    #[put("/:id/tags")]
    #[operation_id("tagPet")]
    pub fn tag_pet(
        &self,
        #[param] id: u64,
        #[body] #[schema(shape = r#"{"type": "string", "format": "csv"}"#)] tags: String,
    ) {
    }
}
