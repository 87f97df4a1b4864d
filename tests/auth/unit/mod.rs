mod test_token_properties;
