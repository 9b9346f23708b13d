mod api_tests;
